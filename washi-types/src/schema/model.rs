//! Schema descriptors: entity types, properties, keys, foreign keys, indexes.
//!
//! Descriptors are declared with Pascal-case names and resolved into a
//! `Model`, which fills in default constraint names and orders entity types
//! principals-first. Physical names are only rewritten when a naming
//! convention is applied to the model.

use std::collections::HashSet;

use super::naming::to_snake_case;
use crate::entity::{ID, Record};
use crate::error::ModelError;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text { max_length: Option<usize> },
    Timestamp,
}

/// A mapped property of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Declared property name, also the key used in `Record`s.
    pub name: &'static str,
    /// Physical column name.
    pub column: String,
    pub column_type: ColumnType,
    pub required: bool,
    /// The store assigns the value on insert.
    pub generated_on_add: bool,
}

impl Property {
    pub fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column: name.to_string(),
            column_type,
            required: false,
            generated_on_add: false,
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn real(name: &'static str) -> Self {
        Self::new(name, ColumnType::Real)
    }

    pub fn text(name: &'static str, max_length: usize) -> Self {
        Self::new(
            name,
            ColumnType::Text {
                max_length: Some(max_length),
            },
        )
    }

    pub fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn generated_on_add(mut self) -> Self {
        self.generated_on_add = true;
        self
    }
}

/// Primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub name: String,
    pub properties: Vec<&'static str>,
}

/// A reference from a dependent property to a principal entity's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub property: &'static str,
    /// Declared name of the principal entity.
    pub principal: &'static str,
    pub constraint_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub properties: Vec<&'static str>,
    pub unique: bool,
}

/// Descriptor of one entity and its table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    /// Declared entity name, e.g. `CountryCurrency`.
    pub name: &'static str,
    pub table: String,
    properties: Vec<Property>,
    primary_key: Key,
    foreign_keys: Vec<ForeignKey>,
    indexes: Vec<Index>,
    seed: Vec<Record>,
}

impl EntityType {
    /// Starts a descriptor with the surrogate `Id` key already mapped.
    pub fn new(name: &'static str, table: &str) -> Self {
        Self {
            name,
            table: table.to_string(),
            properties: vec![Property::integer(ID).required().generated_on_add()],
            primary_key: Key {
                name: String::new(),
                properties: vec![ID],
            },
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            seed: Vec::new(),
        }
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Declares `property` as a reference to `principal`'s key.
    pub fn foreign_key(mut self, property: &'static str, principal: &'static str) -> Self {
        self.foreign_keys.push(ForeignKey {
            property,
            principal,
            constraint_name: String::new(),
        });
        self
    }

    pub fn index(mut self, properties: &[&'static str]) -> Self {
        self.indexes.push(Index {
            name: String::new(),
            properties: properties.to_vec(),
            unique: false,
        });
        self
    }

    pub fn unique_index(mut self, properties: &[&'static str]) -> Self {
        self.indexes.push(Index {
            name: String::new(),
            properties: properties.to_vec(),
            unique: true,
        });
        self
    }

    pub fn with_seed(mut self, seed: Vec<Record>) -> Self {
        self.seed = seed;
        self
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property_named(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Physical column of a declared property.
    pub fn column(&self, property: &str) -> Option<&str> {
        self.property_named(property).map(|p| p.column.as_str())
    }

    pub fn primary_key(&self) -> &Key {
        &self.primary_key
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn seed(&self) -> &[Record] {
        &self.seed
    }

    /// Properties written on insert: everything except store-generated ones.
    pub fn insertable(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| !p.generated_on_add)
    }

    /// Column of the surrogate key.
    pub fn key_column(&self) -> &str {
        self.column(ID).unwrap_or(ID)
    }

    fn check_property(&self, property: &str) -> Result<(), ModelError> {
        if self.property_named(property).is_some() {
            Ok(())
        } else {
            Err(ModelError::UnknownProperty {
                entity: self.name.to_string(),
                property: property.to_string(),
            })
        }
    }

    fn apply_naming(&mut self, convention: impl Fn(&str) -> String) {
        self.table = convention(&self.table);
        for property in &mut self.properties {
            property.column = convention(&property.column);
        }
        self.primary_key.name = convention(&self.primary_key.name);
        for fk in &mut self.foreign_keys {
            fk.constraint_name = convention(&fk.constraint_name);
        }
        for index in &mut self.indexes {
            index.name = convention(&index.name);
        }
    }
}

/// A resolved set of entity types.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    entity_types: Vec<EntityType>,
}

impl Model {
    /// Resolves declared entity types into a model.
    ///
    /// Fills in default names (`PK_<Table>`, `FK_<Table>_<Principal>_<Prop>`,
    /// `IX_<Table>_<Props>`), adds an index for every foreign key not already
    /// leading an index, and orders entity types principals-first.
    pub fn build(entity_types: Vec<EntityType>) -> Result<Self, ModelError> {
        let mut seen = HashSet::new();
        for et in &entity_types {
            if !seen.insert(et.name) {
                return Err(ModelError::DuplicateEntity(et.name.to_string()));
            }
        }

        let tables: Vec<(&'static str, String)> = entity_types
            .iter()
            .map(|et| (et.name, et.table.clone()))
            .collect();
        let table_of = |name: &str| {
            tables
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, t)| t.clone())
        };

        let mut resolved = Vec::with_capacity(entity_types.len());
        for mut et in entity_types {
            for property in &et.primary_key.properties {
                et.check_property(property)?;
            }
            if et.primary_key.name.is_empty() {
                et.primary_key.name = format!("PK_{}", et.table);
            }

            for fk in &mut et.foreign_keys {
                let principal_table =
                    table_of(fk.principal).ok_or_else(|| ModelError::UnknownPrincipal {
                        entity: et.name.to_string(),
                        principal: fk.principal.to_string(),
                    })?;
                if fk.constraint_name.is_empty() {
                    fk.constraint_name =
                        format!("FK_{}_{}_{}", et.table, principal_table, fk.property);
                }
            }
            for fk in &et.foreign_keys {
                et.check_property(fk.property)?;
            }

            let uncovered: Vec<&'static str> = et
                .foreign_keys
                .iter()
                .map(|fk| fk.property)
                .filter(|p| !et.indexes.iter().any(|ix| ix.properties.first() == Some(p)))
                .collect();
            for property in uncovered {
                et.indexes.push(Index {
                    name: String::new(),
                    properties: vec![property],
                    unique: false,
                });
            }

            for index in &mut et.indexes {
                if index.name.is_empty() {
                    index.name = format!("IX_{}_{}", et.table, index.properties.join("_"));
                }
            }
            for index in &et.indexes {
                for property in &index.properties {
                    et.check_property(property)?;
                }
            }

            resolved.push(et);
        }

        Ok(Self {
            entity_types: order_principals_first(resolved)?,
        })
    }

    pub fn entity_types(&self) -> &[EntityType] {
        &self.entity_types
    }

    /// Looks up an entity type by its declared name.
    pub fn entity(&self, name: &str) -> Option<&EntityType> {
        self.entity_types.iter().find(|et| et.name == name)
    }

    /// Rewrites every table, column, key, foreign-key constraint and index
    /// name to snake_case, in place.
    pub fn apply_snake_case_naming(&mut self) {
        self.apply_naming(to_snake_case);
    }

    pub fn apply_naming(&mut self, convention: impl Fn(&str) -> String + Copy) {
        for et in &mut self.entity_types {
            et.apply_naming(convention);
        }
    }
}

/// Stable topological sort: an entity type is emitted after every principal
/// it references, otherwise in declaration order.
fn order_principals_first(mut pending: Vec<EntityType>) -> Result<Vec<EntityType>, ModelError> {
    let mut ordered: Vec<EntityType> = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let ready = pending.iter().position(|et| {
            et.foreign_keys.iter().all(|fk| {
                fk.principal == et.name || ordered.iter().any(|done| done.name == fk.principal)
            })
        });

        match ready {
            Some(pos) => ordered.push(pending.remove(pos)),
            None => return Err(ModelError::Cycle(pending[0].name.to_string())),
        }
    }

    Ok(ordered)
}
