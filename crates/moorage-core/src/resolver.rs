//! 依存関係の解決
//!
//! `depends_on` から有向グラフを作り、Kahn のアルゴリズムで起動順を決めます。
//! 同時に入次数 0 になったサービスは名前順で取り出すため、結果は常に同じです。

use crate::error::{ManifestError, Result};
use crate::model::ServiceSpec;
use crate::translate;
use std::collections::{BTreeMap, BTreeSet};

/// サービスの起動順を解決
///
/// 依存先は必ず依存元より前に並びます。
///
/// # Errors
/// * `UnknownDependency` - 定義されていないサービスへの依存がある
/// * `CircularDependency` - 依存関係が循環している（解決できなかったサービスを名前順で報告）
pub fn resolve_order(services: &BTreeMap<String, ServiceSpec>) -> Result<Vec<String>> {
    let mut in_degree: BTreeMap<&str, usize> =
        services.keys().map(|name| (name.as_str(), 0)).collect();
    let mut dependents: BTreeMap<String, Vec<&str>> = BTreeMap::new();

    for (name, service) in services {
        for dependency in translate::depends_on(service.depends_on.as_ref()) {
            if !services.contains_key(&dependency) {
                return Err(ManifestError::UnknownDependency {
                    service: name.clone(),
                    dependency,
                });
            }
            dependents.entry(dependency).or_default().push(name.as_str());
            if let Some(degree) = in_degree.get_mut(name.as_str()) {
                *degree += 1;
            }
        }
    }

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut order = Vec::with_capacity(services.len());
    while let Some(current) = ready.pop_first() {
        order.push(current.to_string());

        for dependent in dependents.get(current).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() != services.len() {
        let services: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        return Err(ManifestError::CircularDependency { services });
    }

    Ok(order)
}
