use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::value_objects::Iri;

/// Classifies the three kinds of logical entities that can be compared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A named class.
    Concept,
    /// A named individual.
    Individual,
    /// An object property.
    Relation,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Concept => "concept",
            Self::Individual => "individual",
            Self::Relation => "relation",
        };
        f.write_str(name)
    }
}

/// A logical entity identified by its IRI.
///
/// Equality, ordering and hashing only look at the IRI: the kind is derived
/// from the ontology and an IRI is interned with a single kind.
#[derive(Clone, Debug)]
pub enum Entity {
    Concept(Iri),
    Individual(Iri),
    Relation(Iri),
}

impl Entity {
    /// Builds an entity of the given kind.
    #[must_use]
    pub fn new(kind: EntityKind, iri: Iri) -> Self {
        match kind {
            EntityKind::Concept => Self::Concept(iri),
            EntityKind::Individual => Self::Individual(iri),
            EntityKind::Relation => Self::Relation(iri),
        }
    }

    /// Returns the entity identifier.
    #[must_use]
    pub fn iri(&self) -> &Iri {
        match self {
            Self::Concept(iri) | Self::Individual(iri) | Self::Relation(iri) => iri,
        }
    }

    /// Returns the entity kind.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Concept(_) => EntityKind::Concept,
            Self::Individual(_) => EntityKind::Individual,
            Self::Relation(_) => EntityKind::Relation,
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.iri() == other.iri()
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.iri().hash(state);
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iri().cmp(other.iri())
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self.iri(), f)
    }
}

/// One outgoing typed edge of an entity: `(relation, destination)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link {
    relation: Entity,
    destination: Entity,
}

impl Link {
    /// Creates a link through `relation` towards `destination`.
    #[must_use]
    pub fn new(relation: Entity, destination: Entity) -> Self {
        Self {
            relation,
            destination,
        }
    }

    /// Returns the relation of the link.
    #[must_use]
    pub fn relation(&self) -> &Entity {
        &self.relation
    }

    /// Returns the destination of the link.
    #[must_use]
    pub fn destination(&self) -> &Entity {
        &self.destination
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.relation, self.destination)
    }
}

/// Anonymous existential restriction `property some filler`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Restriction {
    pub property: Iri,
    pub filler: Iri,
}

impl Restriction {
    #[must_use]
    pub fn some(property: Iri, filler: Iri) -> Self {
        Self { property, filler }
    }
}

/// A named class: its direct named superclasses and the `some` restrictions
/// it is declared a subclass of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    id: Iri,
    super_classes: BTreeSet<Iri>,
    restrictions: BTreeSet<Restriction>,
}

impl Class {
    #[must_use]
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            super_classes: BTreeSet::new(),
            restrictions: BTreeSet::new(),
        }
    }

    /// Returns `false` when `parent` was already declared.
    pub fn add_parent(&mut self, parent: Iri) -> bool {
        self.super_classes.insert(parent)
    }

    /// Declares the class a subclass of the anonymous `property some filler`.
    pub fn add_restriction(&mut self, property: Iri, filler: Iri) -> bool {
        self.restrictions.insert(Restriction::some(property, filler))
    }

    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    /// Direct named superclasses in lexical order.
    #[must_use]
    pub fn parents(&self) -> &BTreeSet<Iri> {
        &self.super_classes
    }

    #[must_use]
    pub fn restrictions(&self) -> &BTreeSet<Restriction> {
        &self.restrictions
    }
}

/// A named property. Only object properties take part in the relation
/// hierarchy; data properties are kept so literal assertions validate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    id: Iri,
    kind: PropertyKind,
    super_properties: BTreeSet<Iri>,
    assertions: BTreeSet<(Iri, Iri)>,
}

impl Property {
    #[must_use]
    pub fn new(id: Iri, kind: PropertyKind) -> Self {
        Self {
            id,
            kind,
            super_properties: BTreeSet::new(),
            assertions: BTreeSet::new(),
        }
    }

    /// Declares a named super-property. It must already be part of the
    /// ontology when this property is added.
    pub fn add_parent(&mut self, parent: Iri) -> bool {
        self.super_properties.insert(parent)
    }

    /// Records a statement whose subject is the property itself, such as
    /// `inverseOf` or an annotation pointing at a class.
    pub fn add_assertion(&mut self, predicate: Iri, object: Iri) -> bool {
        self.assertions.insert((predicate, object))
    }

    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    #[must_use]
    pub fn parents(&self) -> &BTreeSet<Iri> {
        &self.super_properties
    }

    /// `(predicate, object)` statements made about the property.
    #[must_use]
    pub fn assertions(&self) -> &BTreeSet<(Iri, Iri)> {
        &self.assertions
    }
}

/// Whether a property links resources or carries literal values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    Object,
    Data,
}

/// Value of a property assertion made about an individual.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyAssertion {
    /// Another named resource, individual or class. Only these become links.
    Resource(Iri),
    Literal(String),
}

/// A named individual with its asserted types and property values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Individual {
    id: Iri,
    types: BTreeSet<Iri>,
    assertions: BTreeMap<Iri, Vec<PropertyAssertion>>,
}

impl Individual {
    #[must_use]
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            types: BTreeSet::new(),
            assertions: BTreeMap::new(),
        }
    }

    /// Declares `class` a direct type of the individual.
    pub fn assert_type(&mut self, class: Iri) -> bool {
        self.types.insert(class)
    }

    pub fn assert_property(&mut self, property: Iri, value: PropertyAssertion) {
        self.assertions.entry(property).or_default().push(value);
    }

    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    /// Direct types only.
    #[must_use]
    pub fn types(&self) -> &BTreeSet<Iri> {
        &self.types
    }

    #[must_use]
    pub fn assertions(&self) -> &BTreeMap<Iri, Vec<PropertyAssertion>> {
        &self.assertions
    }
}

/// In-memory ontology: named classes, properties and individuals keyed by
/// IRI.
///
/// A class and an individual never share an IRI, so every identifier maps to
/// one entity kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ontology {
    id: Iri,
    label: Option<String>,
    classes: BTreeMap<Iri, Class>,
    properties: BTreeMap<Iri, Property>,
    individuals: BTreeMap<Iri, Individual>,
}

impl Ontology {
    #[must_use]
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            label: None,
            classes: BTreeMap::new(),
            properties: BTreeMap::new(),
            individuals: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a class.
    ///
    /// Parents and restriction fillers may be declared later, so they are not
    /// checked here.
    pub fn add_class(&mut self, class: Class) -> Result<(), OntologyError> {
        let iri = class.id().clone();
        self.ensure_undeclared(&iri)?;
        self.classes.insert(iri, class);
        Ok(())
    }

    /// Adds a property. Its super-properties must already be present, which
    /// keeps the declared property hierarchy acyclic.
    pub fn add_property(&mut self, property: Property) -> Result<(), OntologyError> {
        let iri = property.id().clone();
        if self.properties.contains_key(&iri) {
            return Err(OntologyError::AlreadyDeclared {
                iri,
                existing: EntityKind::Relation,
            });
        }
        if let Some(parent) = property
            .parents()
            .iter()
            .find(|parent| !self.properties.contains_key(*parent))
        {
            return Err(self.unknown_property(parent));
        }
        self.properties.insert(iri, property);
        Ok(())
    }

    /// Adds an individual whose types and asserted properties are already
    /// declared. Object properties take resources and data properties take
    /// literals.
    pub fn add_individual(&mut self, individual: Individual) -> Result<(), OntologyError> {
        let iri = individual.id().clone();
        self.ensure_undeclared(&iri)?;

        if let Some(class) = individual
            .types()
            .iter()
            .find(|class| !self.classes.contains_key(*class))
        {
            return Err(OntologyError::UnknownClass {
                ontology: self.id.clone(),
                class: class.clone(),
            });
        }

        for (property, values) in individual.assertions() {
            let kind = self
                .properties
                .get(property)
                .map(Property::kind)
                .ok_or_else(|| self.unknown_property(property))?;
            let matches_kind = values.iter().all(|value| {
                matches!(
                    (kind, value),
                    (PropertyKind::Object, PropertyAssertion::Resource(_))
                        | (PropertyKind::Data, PropertyAssertion::Literal(_))
                )
            });
            if !matches_kind {
                return Err(OntologyError::AssertionKindMismatch {
                    ontology: self.id.clone(),
                    property: property.clone(),
                });
            }
        }

        self.individuals.insert(iri, individual);
        Ok(())
    }

    fn ensure_undeclared(&self, iri: &Iri) -> Result<(), OntologyError> {
        let existing = if self.classes.contains_key(iri) {
            EntityKind::Concept
        } else if self.individuals.contains_key(iri) {
            EntityKind::Individual
        } else {
            return Ok(());
        };
        Err(OntologyError::AlreadyDeclared {
            iri: iri.clone(),
            existing,
        })
    }

    fn unknown_property(&self, property: &Iri) -> OntologyError {
        OntologyError::UnknownProperty {
            ontology: self.id.clone(),
            property: property.clone(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[must_use]
    pub fn class(&self, id: &Iri) -> Option<&Class> {
        self.classes.get(id)
    }

    #[must_use]
    pub fn property(&self, id: &Iri) -> Option<&Property> {
        self.properties.get(id)
    }

    #[must_use]
    pub fn individual(&self, id: &Iri) -> Option<&Individual> {
        self.individuals.get(id)
    }

    #[must_use]
    pub fn classes(&self) -> &BTreeMap<Iri, Class> {
        &self.classes
    }

    #[must_use]
    pub fn properties(&self) -> &BTreeMap<Iri, Property> {
        &self.properties
    }

    #[must_use]
    pub fn individuals(&self) -> &BTreeMap<Iri, Individual> {
        &self.individuals
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OntologyError {
    #[error("`{iri}` is already declared as a {existing}")]
    AlreadyDeclared { iri: Iri, existing: EntityKind },
    #[error("`{class}` is not a class of `{ontology}`")]
    UnknownClass { ontology: Iri, class: Iri },
    #[error("`{property}` is not a property of `{ontology}`")]
    UnknownProperty { ontology: Iri, property: Iri },
    #[error("value asserted through `{property}` in `{ontology}` does not match the property kind")]
    AssertionKindMismatch { ontology: Iri, property: Iri },
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use super::{
        Class, Entity, EntityKind, Individual, Link, Ontology, OntologyError, Property,
        PropertyAssertion, PropertyKind,
    };
    use crate::ontology::value_objects::Iri;

    fn iri(text: &str) -> Iri {
        Iri::new(text).expect("valid iri")
    }

    #[test]
    fn class_parents_and_restrictions_are_tracked() {
        let mut class = Class::new(iri("http://example.org/Patient"));
        assert!(class.add_parent(iri("http://example.org/Person")));
        assert!(class.parents().contains(&iri("http://example.org/Person")));
        assert!(!class.add_parent(iri("http://example.org/Person")));
        assert_eq!(class.parents().len(), 1);

        assert!(class.add_restriction(
            iri("http://example.org/hasDiagnosis"),
            iri("http://example.org/Cancer")
        ));
        assert!(!class.add_restriction(
            iri("http://example.org/hasDiagnosis"),
            iri("http://example.org/Cancer")
        ));
        assert_eq!(class.restrictions().len(), 1);
    }

    #[test]
    fn entity_identity_is_the_iri() {
        let concept = Entity::Concept(iri("http://example.org/A"));
        let placeholder = Entity::Individual(iri("http://example.org/A"));
        assert_eq!(concept, placeholder);
        assert_eq!(concept.kind(), EntityKind::Concept);
        assert_eq!(
            Entity::new(EntityKind::Relation, iri("http://example.org/r")).kind(),
            EntityKind::Relation
        );

        let set: HashSet<_> = [concept, placeholder].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn links_are_deduplicated_structurally() {
        let make = || {
            Link::new(
                Entity::Relation(iri("http://example.org/hasDiagnosis")),
                Entity::Concept(iri("http://example.org/Cancer")),
            )
        };
        let links: BTreeSet<_> = [make(), make()].into_iter().collect();
        assert_eq!(links.len(), 1);
        assert_eq!(
            make().to_string(),
            "http://example.org/hasDiagnosis http://example.org/Cancer"
        );
    }

    #[test]
    fn super_properties_must_be_declared_first() {
        let mut ontology = Ontology::new(iri("http://example.org/onto"));
        ontology
            .add_property(Property::new(iri("http://example.org/related"), PropertyKind::Object))
            .expect("parent inserted");

        let mut property = Property::new(iri("http://example.org/partOf"), PropertyKind::Object);
        property.add_parent(iri("http://example.org/related"));
        assert!(property.add_assertion(
            iri("http://www.w3.org/2002/07/owl#inverseOf"),
            iri("http://example.org/hasPart")
        ));
        ontology
            .add_property(property.clone())
            .expect("property inserted");
        assert_eq!(ontology.property(property.id()), Some(&property));

        let duplicate = Property::new(iri("http://example.org/partOf"), PropertyKind::Object);
        let err = ontology.add_property(duplicate).expect_err("duplicate");
        assert!(matches!(err, OntologyError::AlreadyDeclared { existing: EntityKind::Relation, .. }));

        let mut orphan = Property::new(iri("http://example.org/orphan"), PropertyKind::Object);
        orphan.add_parent(iri("http://example.org/unknown"));
        let err = ontology.add_property(orphan).expect_err("missing parent");
        assert!(matches!(err, OntologyError::UnknownProperty { .. }));
    }

    #[test]
    fn individuals_must_reference_declared_classes() {
        let mut ontology = Ontology::new(iri("http://example.org/onto"));
        let mut individual = Individual::new(iri("http://example.org/alice"));
        individual.assert_type(iri("http://example.org/Missing"));
        let err = ontology.add_individual(individual).expect_err("missing class");
        assert!(matches!(err, OntologyError::UnknownClass { .. }));
    }

    #[test]
    fn individual_insertion_checks_references() {
        let mut ontology = Ontology::new(iri("http://example.org/onto"));
        ontology
            .add_class(Class::new(iri("http://example.org/Class")))
            .expect("class inserted");
        ontology
            .add_property(Property::new(
                iri("http://example.org/prop"),
                PropertyKind::Object,
            ))
            .expect("property inserted");

        let mut individual = Individual::new(iri("http://example.org/alice"));
        individual.assert_type(iri("http://example.org/Class"));
        individual.assert_property(
            iri("http://example.org/prop"),
            PropertyAssertion::Resource(iri("http://example.org/bob")),
        );

        ontology
            .add_individual(individual)
            .expect("individual inserted");

        let clash = Individual::new(iri("http://example.org/Class"));
        let err = ontology.add_individual(clash).expect_err("id taken by class");
        assert!(matches!(err, OntologyError::AlreadyDeclared { existing: EntityKind::Concept, .. }));
    }

    #[test]
    fn individual_insertion_rejects_mismatched_property_kind() {
        let mut ontology = Ontology::new(iri("http://example.org/onto"));
        ontology
            .add_class(Class::new(iri("http://example.org/Class")))
            .expect("class inserted");
        ontology
            .add_property(Property::new(iri("http://example.org/prop"), PropertyKind::Data))
            .expect("property inserted");

        let mut individual = Individual::new(iri("http://example.org/alice"));
        individual.assert_type(iri("http://example.org/Class"));
        individual.assert_property(
            iri("http://example.org/prop"),
            PropertyAssertion::Resource(iri("http://example.org/bob")),
        );

        let err = ontology
            .add_individual(individual)
            .expect_err("mismatched property kind");
        assert!(matches!(err, OntologyError::AssertionKindMismatch { .. }));
    }
}
