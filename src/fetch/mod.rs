//! Descarga de soportes remotos (facturas, comprobantes de pago, planillas).
//!
//! El ensamblador solo conoce el trait [`FileFetcher`]; en producción se usa
//! [`HttpFetcher`] y en pruebas un stub en memoria.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::debug;

use crate::core::FetchError;

#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Descarga el contenido completo del archivo referenciado por `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// Cliente HTTP de producción sobre `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Sin timeout propio: la cancelación se decide envolviendo la llamada
    /// de ensamblaje completa, no descarga por descarga.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        debug!(url, "descargando soporte");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.bytes().await?)
    }
}

/// Descarga un lote de URLs con concurrencia acotada, preservando el orden
/// de entrada. Cada posición del resultado corresponde a la URL homónima;
/// las fallas individuales no cancelan el resto del lote.
pub async fn prefetch(
    fetcher: Arc<dyn FileFetcher>,
    urls: &[String],
    concurrency: usize,
) -> Vec<Result<Bytes, FetchError>> {
    stream::iter(urls.iter().cloned())
        .map(|url| {
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.fetch(&url).await }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapFetcher {
        files: HashMap<String, Bytes>,
    }

    #[async_trait]
    impl FileFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
            self.files
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    #[tokio::test]
    async fn prefetch_preserva_el_orden_de_entrada() {
        let mut files = HashMap::new();
        for i in 0..6 {
            files.insert(format!("https://cdn/f{}.pdf", i), Bytes::from(vec![i as u8]));
        }
        let fetcher = Arc::new(MapFetcher { files });

        let urls: Vec<String> = (0..6).map(|i| format!("https://cdn/f{}.pdf", i)).collect();
        let results = prefetch(fetcher, &urls, 3).await;

        assert_eq!(results.len(), 6);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.as_ref().unwrap()[0], i as u8);
        }
    }

    #[tokio::test]
    async fn prefetch_aisla_las_fallas_individuales() {
        let mut files = HashMap::new();
        files.insert("https://cdn/ok.pdf".to_string(), Bytes::from_static(b"%PDF"));
        let fetcher = Arc::new(MapFetcher { files });

        let urls = vec![
            "https://cdn/ok.pdf".to_string(),
            "https://cdn/roto.pdf".to_string(),
            "https://cdn/ok.pdf".to_string(),
        ];
        let results = prefetch(fetcher, &urls, 2).await;

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(FetchError::Status { status: 404, .. })
        ));
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn prefetch_con_lote_vacio() {
        let fetcher = Arc::new(MapFetcher {
            files: HashMap::new(),
        });
        let results = prefetch(fetcher, &[], 4).await;
        assert!(results.is_empty());
    }
}
