//! Geographic and currency reference data.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, ID, Record};
use crate::error::DomainError;
use crate::schema::{EntityType, Property};

/// A currency accepted in one or more countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: Option<i64>,
    pub name: String,
    pub symbol: String,
}

impl Currency {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

impl Entity for Currency {
    const NAME: &'static str = "Currency";
    const LABEL: &'static str = "currency";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "Currencies")
            .property(Property::text("Name", 50).required())
            .property(Property::text("Symbol", 5).required())
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with(ID, self.id)
            .with("Name", self.name.as_str())
            .with("Symbol", self.symbol.as_str())
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            name: record.text("Name")?,
            symbol: record.text("Symbol")?,
        })
    }

    fn apply_patch(&mut self, patch: &Self) {
        self.name = patch.name.clone();
        self.symbol = patch.symbol.clone();
    }

    fn seed() -> Vec<Self> {
        [(1, "Sol", "S/"), (2, "Dólar Estadounidense", "$"), (3, "Euro", "€")]
            .into_iter()
            .map(|(id, name, symbol)| Self {
                id: Some(id),
                name: name.into(),
                symbol: symbol.into(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: Option<i64>,
    pub name: String,
}

impl Country {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl Entity for Country {
    const NAME: &'static str = "Country";
    const LABEL: &'static str = "country";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "Countries").property(Property::text("Name", 50).required())
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with(ID, self.id)
            .with("Name", self.name.as_str())
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            name: record.text("Name")?,
        })
    }

    fn apply_patch(&mut self, patch: &Self) {
        self.name = patch.name.clone();
    }

    fn seed() -> Vec<Self> {
        vec![
            Self {
                id: Some(1),
                name: "Perú".into(),
            },
            Self {
                id: Some(2),
                name: "Estados Unidos".into(),
            },
        ]
    }
}

/// First-level administrative division of a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: Option<i64>,
    pub name: String,
    pub country_id: i64,
}

impl Entity for Department {
    const NAME: &'static str = "Department";
    const LABEL: &'static str = "department";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "Departments")
            .property(Property::text("Name", 50).required())
            .property(Property::integer("CountryId").required())
            .foreign_key("CountryId", "Country")
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with(ID, self.id)
            .with("Name", self.name.as_str())
            .with("CountryId", self.country_id)
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            name: record.text("Name")?,
            country_id: record.integer("CountryId")?,
        })
    }

    fn apply_patch(&mut self, patch: &Self) {
        self.name = patch.name.clone();
    }
}

/// Join row: one currency accepted in one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryCurrency {
    pub id: Option<i64>,
    pub country_id: i64,
    pub currency_id: i64,
}

impl Entity for CountryCurrency {
    const NAME: &'static str = "CountryCurrency";
    const LABEL: &'static str = "country currency";

    fn entity_type() -> EntityType {
        EntityType::new(Self::NAME, "CountryCurrencies")
            .property(Property::integer("CountryId").required())
            .property(Property::integer("CurrencyId").required())
            .foreign_key("CountryId", "Country")
            .foreign_key("CurrencyId", "Currency")
            .unique_index(&["CountryId", "CurrencyId"])
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with(ID, self.id)
            .with("CountryId", self.country_id)
            .with("CurrencyId", self.currency_id)
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        Ok(Self {
            id: record.id(),
            country_id: record.integer("CountryId")?,
            currency_id: record.integer("CurrencyId")?,
        })
    }

    fn apply_patch(&mut self, patch: &Self) {
        self.country_id = patch.country_id;
        self.currency_id = patch.currency_id;
    }

    fn seed() -> Vec<Self> {
        [(1, 1, 1), (2, 1, 2), (3, 1, 3), (4, 2, 2)]
            .into_iter()
            .map(|(id, country_id, currency_id)| Self {
                id: Some(id),
                country_id,
                currency_id,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_seed_ids() {
        let ids: Vec<_> = Currency::seed().iter().filter_map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_country_currency_pairs_reference_seeded_rows() {
        let countries: Vec<_> = Country::seed().iter().filter_map(|c| c.id).collect();
        let currencies: Vec<_> = Currency::seed().iter().filter_map(|c| c.id).collect();

        for pair in CountryCurrency::seed() {
            assert!(countries.contains(&pair.country_id));
            assert!(currencies.contains(&pair.currency_id));
        }
    }

    #[test]
    fn test_department_patch_keeps_country() {
        let mut dept = Department {
            id: Some(1),
            name: "Lima".into(),
            country_id: 1,
        };
        dept.apply_patch(&Department {
            id: None,
            name: "Cusco".into(),
            country_id: 2,
        });
        assert_eq!(dept.name, "Cusco");
        assert_eq!(dept.country_id, 1);
    }
}
