use thiserror::Error;

/// Errores fatales: abortan la llamada completa de ensamblaje.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Solicitud inválida: {0}")]
    InvalidRequest(String),

    #[error("Error construyendo el documento base: {0}")]
    Document(#[from] lopdf::Error),
}

/// Errores recuperables por adjunto: se registran y el paquete continúa.
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Error descargando archivo: {0}")]
    Fetch(#[from] FetchError),

    #[error("Error decodificando contenido: {0}")]
    Decode(String),

    #[error("Error incrustando contenido: {0}")]
    Embed(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Error HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Respuesta inválida para {url}: {status}")]
    Status { url: String, status: u16 },
}

impl From<std::io::Error> for AssemblyError {
    fn from(error: std::io::Error) -> Self {
        AssemblyError::Document(lopdf::Error::from(error))
    }
}

impl From<lopdf::Error> for AttachmentError {
    fn from(error: lopdf::Error) -> Self {
        AttachmentError::Decode(error.to_string())
    }
}

impl From<image::ImageError> for AttachmentError {
    fn from(error: image::ImageError) -> Self {
        AttachmentError::Decode(error.to_string())
    }
}

pub type AssemblyResult<T> = Result<T, AssemblyError>;
