use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "Dockerに接続できません: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • DOCKER_HOST の設定を確認してください"
    )]
    DockerConnectionFailed(String),

    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    #[error("イメージ '{image}' のダウンロードに失敗しました: {message}")]
    ImagePullFailed { image: String, message: String },

    #[error("Docker APIエラー: {0}")]
    DockerApiError(String),
}

impl From<bollard::errors::Error> for ContainerError {
    fn from(err: bollard::errors::Error) -> Self {
        match &err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => ContainerError::NotFound(message.clone()),
            _ => {
                // 接続エラーの可能性をチェック
                let err_str = err.to_string();
                if err_str.contains("Connection refused")
                    || err_str.contains("No such file or directory")
                {
                    ContainerError::DockerConnectionFailed(err_str)
                } else {
                    ContainerError::DockerApiError(err_str)
                }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;
