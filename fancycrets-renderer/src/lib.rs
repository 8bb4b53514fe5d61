//! # fancycrets-renderer
//!
//! Turns decoded source data plus `fancycrets.secretFormat.*` templates into
//! encoded secret entries.
//!
//! ## Usage
//!
//! ```rust
//! use fancycrets_core::{DecodedData, FormatSpec};
//! use fancycrets_renderer::{codec, compose};
//!
//! let mut data = DecodedData::new();
//! data.insert("user".into(), "joe".into());
//! data.insert("pass".into(), "pass".into());
//! let mut formats = FormatSpec::new();
//! formats.insert("conn".into(), "{user}:{pass}".into());
//!
//! let patch = compose(&formats, &data).unwrap();
//! assert_eq!(codec::decode("app", "conn", &patch["conn"]).unwrap(), "joe:pass");
//! ```

pub mod codec;
pub mod engine;
pub mod error;
pub mod template;

pub use engine::{compose, overlay, render_value};
pub use error::RenderError;
pub use template::Template;
