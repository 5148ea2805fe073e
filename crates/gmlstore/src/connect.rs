use gmlstore_core::{driver::Driver, Error, Result};

use url::Url;

/// Opens the driver matching the scheme of a connection URL.
pub async fn driver_for(url: &str) -> Result<Box<dyn Driver>> {
    let parsed = Url::parse(url)?;

    match parsed.scheme() {
        "postgresql" | "postgres" => connect_postgresql(url).await,
        scheme => Err(Error::unsupported_feature(format!(
            "unsupported database; scheme={scheme}; url={parsed}"
        ))),
    }
}

#[cfg(feature = "postgresql")]
async fn connect_postgresql(url: &str) -> Result<Box<dyn Driver>> {
    let driver = gmlstore_driver_postgresql::PostgreSQL::connect(url).await?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "postgresql"))]
async fn connect_postgresql(_url: &str) -> Result<Box<dyn Driver>> {
    Err(Error::unsupported_feature("`postgresql` feature not enabled"))
}
