use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReachError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Overpass XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    Geojson(#[from] geojson::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("unexpected isochrone response: {message}")]
    IsochroneResponse { message: String },
}

pub type Result<T> = std::result::Result<T, ReachError>;
