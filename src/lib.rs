//! Semantic similarity between the classes, individuals and relations of an
//! ontology.
//!
//! ```
//! use ontosim::{
//!     config::SimilaritySettings,
//!     ontology::{Class, Iri, Ontology},
//!     similarity::SimilarityEngine,
//! };
//!
//! # fn main() -> ontosim::Result<()> {
//! let iri = |name: &str| Iri::new(format!("http://example.org/{name}"));
//! let mut ontology = Ontology::new(iri("onto")?);
//! ontology.add_class(Class::new(iri("Top")?)).expect("top");
//! for name in ["Left", "Right"] {
//!     let mut class = Class::new(iri(name)?);
//!     class.add_parent(iri("Top")?);
//!     ontology.add_class(class).expect("class");
//! }
//!
//! let engine = SimilarityEngine::new(ontology, SimilaritySettings::default());
//! let left = engine.resolve(&iri("Left")?);
//! let right = engine.resolve(&iri("Right")?);
//! // Top is one step below the root and one step above each class.
//! let taxonomic = engine.taxonomic_similarity(&left, &right)?;
//! assert!((taxonomic - 1.0 / 3.0).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod logger;
pub mod ontology;
pub mod similarity;

pub use errors::{Error, Result};
