use derive_more::{Display, Error};
use exn::ResultExt;
use shelf_catalog::error::{ErrorKind as CatalogErrorKind, Result as CatalogResult};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open library")]
    Storage,
    /// A collection or chapter named on the command line isn't in the library.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("could not read library")]
    Catalog,
    #[display("could not write output")]
    Output,
}

impl ErrorKind {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound(_) => 2,
            _ => 1,
        }
    }
}

/// Raises catalog failures into CLI errors, keeping "not found" distinct.
pub fn lift<T>(result: CatalogResult<T>) -> Result<T> {
    let err = match result {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    let missing = match &*err {
        CatalogErrorKind::NotFound(what) => Some(what.clone()),
        _ => None,
    };
    match missing {
        Some(what) => Err(err).or_raise(|| ErrorKind::NotFound(what)),
        None => Err(err).or_raise(|| ErrorKind::Catalog),
    }
}
