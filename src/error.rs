use thiserror::Error;

use crate::model::ERROR_PREFIX;

/// Generic text when the server gives no usable `detail`.
pub const GENERIC_DETAIL: &str = "Erro no download";

/// Everything that can end a download attempt without a saved file
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Por favor, insira um link válido do YouTube")]
    Validation,

    /// Non-2xx response; `detail` is shown verbatim.
    #[error("{detail}")]
    Server { status: u16, detail: String },

    #[error("resposta inválida do servidor (HTTP {status}): {source}")]
    MalformedErrorBody {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("falha ao salvar o arquivo: {0}")]
    Io(#[from] std::io::Error),

    #[error("download cancelado")]
    Cancelled,

    #[error("tarefa de download interrompida: {0}")]
    Runtime(String),
}

impl DownloadError {
    /// Status line for this error, always carrying the error prefix.
    pub fn status_message(&self) -> String {
        format!("{ERROR_PREFIX}: {self}")
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_detail_is_verbatim() {
        let err = DownloadError::Server {
            status: 400,
            detail: "invalid url".into(),
        };
        assert_eq!(err.status_message(), "Erro: invalid url");
    }

    #[test]
    fn validation_is_coloured_as_error() {
        assert!(DownloadError::Validation.status_message().starts_with(ERROR_PREFIX));
    }

    #[test]
    fn cancelled_is_an_error_line() {
        assert_eq!(DownloadError::Cancelled.status_message(), "Erro: download cancelado");
    }
}
