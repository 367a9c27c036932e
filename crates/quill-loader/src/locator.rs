//! Module location strategy
//!
//! An `import module` clause carries a logical namespace URI and zero or
//! more location hints. A [`ModuleLocator`] turns those into loadable source
//! text. Hosts may install their own locator; [`DefaultModuleLocator`] is
//! the built-in file/network implementation, and a user locator can defer to
//! it by returning [`Resolution::Deferred`].

use crate::charset;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Errors raised while locating a module
///
/// Every variant classifies as "cannot locate module" (`XQST0059`); the
/// variants preserve the underlying cause for diagnostics.
#[derive(Debug, Error)]
pub enum LocateError {
    /// The import clause carried no location hints
    #[error("Cannot locate module {module}: no location hints were given")]
    NoHints {
        /// The module's logical URI, when known
        module: String,
    },

    /// A hint or base URI failed to parse or absolutize
    #[error("Cannot locate module: invalid location URI {uri}")]
    InvalidUri {
        /// The offending URI text
        uri: String,
        /// The parse failure
        #[source]
        source: url::ParseError,
    },

    /// A hint was relative and no usable base URI was available
    #[error("Cannot locate module: relative hint {hint} with no base URI")]
    NoBase {
        /// The relative hint
        hint: String,
    },

    /// The hint's URI scheme is not supported by this locator
    #[error("Cannot locate module {system_id}: unsupported URI scheme {scheme}")]
    UnsupportedScheme {
        /// The resolved location
        system_id: String,
        /// Its scheme
        scheme: String,
    },

    /// Reading a local resource failed
    #[error("Cannot locate module {system_id}")]
    Io {
        /// The resolved location
        system_id: String,
        /// The I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Fetching a remote resource failed
    #[error("Cannot locate module {system_id}")]
    Http {
        /// The resolved location
        system_id: String,
        /// The transport failure
        #[source]
        source: reqwest::Error,
    },

    /// The remote server answered with a non-success status
    #[error("Cannot locate module {system_id}: HTTP status {status}")]
    HttpStatus {
        /// The resolved location
        system_id: String,
        /// The status code
        status: u16,
    },

    /// Every installed locator deferred
    #[error("Cannot locate module {module}: no locator produced it")]
    Exhausted {
        /// The module's logical URI, when known
        module: String,
    },
}

impl LocateError {
    /// The stable query-language error code: always `XQST0059`
    pub fn code(&self) -> &'static str {
        "XQST0059"
    }
}

/// Source text of a located module
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleSource {
    /// Already decoded to characters
    Text(String),
    /// Raw bytes; the caller's parser performs BOM/declaration sniffing
    Bytes(Vec<u8>),
}

/// One located module resource
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedModule {
    /// Absolute system id of the resource. Non-empty by contract: it becomes
    /// the base URI for resolution nested inside the module.
    pub system_id: String,
    /// The module's source
    pub source: ModuleSource,
    /// The charset advertised by the transport, when any
    pub encoding: Option<String>,
}

/// Outcome of a locator invocation
#[derive(Debug)]
pub enum Resolution {
    /// The locator produced the module's resources
    Resolved(Vec<LocatedModule>),
    /// The locator declines; try the next strategy
    Deferred,
}

/// Strategy turning a module's logical identity and hints into source text
pub trait ModuleLocator {
    /// Locate a module
    ///
    /// `module_uri` is the logical namespace URI from the import clause,
    /// `base_uri` the importing module's base, `hints` the literal location
    /// hints. May block on file or network I/O; callers must not hold
    /// compile-time locks across this call.
    fn locate(
        &self,
        module_uri: Option<&str>,
        base_uri: Option<&str>,
        hints: &[String],
    ) -> Result<Resolution, LocateError>;
}

/// Run a user locator with fallback to a default
///
/// The user locator's `Deferred` hands the request to `fallback`; a
/// `Deferred` from the fallback too means nothing could produce the module.
pub fn locate_with_fallback(
    primary: &dyn ModuleLocator,
    fallback: &dyn ModuleLocator,
    module_uri: Option<&str>,
    base_uri: Option<&str>,
    hints: &[String],
) -> Result<Vec<LocatedModule>, LocateError> {
    match primary.locate(module_uri, base_uri, hints)? {
        Resolution::Resolved(modules) => Ok(modules),
        Resolution::Deferred => match fallback.locate(module_uri, base_uri, hints)? {
            Resolution::Resolved(modules) => Ok(modules),
            Resolution::Deferred => Err(LocateError::Exhausted {
                module: module_uri.unwrap_or("(unknown)").to_string(),
            }),
        },
    }
}

/// The built-in file/network locator
///
/// Resolves every hint against the base URI and loads it. Local files are
/// always handed back undecoded (there is no transport header to consult);
/// HTTP responses are decoded according to the Content-Type charset when one
/// is advertised and known.
pub struct DefaultModuleLocator {
    client: reqwest::blocking::Client,
}

impl Default for DefaultModuleLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultModuleLocator {
    /// Create a locator with a default HTTP client
    pub fn new() -> Self {
        DefaultModuleLocator {
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Load one resolved location
    fn fetch(&self, location: &Url) -> Result<LocatedModule, LocateError> {
        let system_id = location.as_str().to_string();
        match location.scheme() {
            "file" => {
                let path = location
                    .to_file_path()
                    .map_err(|_| LocateError::UnsupportedScheme {
                        system_id: system_id.clone(),
                        scheme: "file".to_string(),
                    })?;
                let bytes = std::fs::read(&path).map_err(|source| LocateError::Io {
                    system_id: system_id.clone(),
                    source,
                })?;
                Ok(LocatedModule {
                    system_id,
                    source: ModuleSource::Bytes(bytes),
                    encoding: None,
                })
            }
            "http" | "https" => self.fetch_http(location, system_id),
            other => Err(LocateError::UnsupportedScheme {
                system_id,
                scheme: other.to_string(),
            }),
        }
    }

    fn fetch_http(&self, location: &Url, system_id: String) -> Result<LocatedModule, LocateError> {
        let response =
            self.client
                .get(location.clone())
                .send()
                .map_err(|source| LocateError::Http {
                    system_id: system_id.clone(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LocateError::HttpStatus {
                system_id,
                status: status.as_u16(),
            });
        }

        let advertised = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset::charset_from_content_type);

        let bytes = response.bytes().map_err(|source| LocateError::Http {
            system_id: system_id.clone(),
            source,
        })?;

        // A known advertised charset is decoded here; anything else stays
        // raw so the caller's parser can sniff.
        let source = match advertised
            .as_deref()
            .and_then(|label| charset::decode(&bytes, label))
        {
            Some(text) => ModuleSource::Text(text),
            None => ModuleSource::Bytes(bytes.to_vec()),
        };

        Ok(LocatedModule {
            system_id,
            source,
            encoding: advertised,
        })
    }
}

impl ModuleLocator for DefaultModuleLocator {
    fn locate(
        &self,
        module_uri: Option<&str>,
        base_uri: Option<&str>,
        hints: &[String],
    ) -> Result<Resolution, LocateError> {
        if hints.is_empty() {
            return Err(LocateError::NoHints {
                module: module_uri.unwrap_or("(unknown)").to_string(),
            });
        }
        let mut modules = Vec::with_capacity(hints.len());
        for hint in hints {
            let location = absolutize(hint, base_uri)?;
            modules.push(self.fetch(&location)?);
        }
        Ok(Resolution::Resolved(modules))
    }
}

/// Resolve a location hint to an absolute URL against an optional base
fn absolutize(hint: &str, base_uri: Option<&str>) -> Result<Url, LocateError> {
    match Url::parse(hint) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if let Some(base) = base_uri {
                let base_url = Url::parse(base).map_err(|source| LocateError::InvalidUri {
                    uri: base.to_string(),
                    source,
                })?;
                base_url.join(hint).map_err(|source| LocateError::InvalidUri {
                    uri: hint.to_string(),
                    source,
                })
            } else if Path::new(hint).is_absolute() {
                Url::from_file_path(hint).map_err(|_| LocateError::NoBase {
                    hint: hint.to_string(),
                })
            } else {
                Err(LocateError::NoBase {
                    hint: hint.to_string(),
                })
            }
        }
        Err(source) => Err(LocateError::InvalidUri {
            uri: hint.to_string(),
            source,
        }),
    }
}
