//! Customer records and the dynamic items that flow through DSL pipelines.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A customer record as loaded from the JSON data file.
///
/// JSON keys are camelCase; the snake_case spellings produced by common
/// mock-data generators are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    id: u32,
    #[serde(alias = "first_name")]
    first_name: String,
    #[serde(alias = "last_name")]
    last_name: String,
    email: String,
    gender: String,
    age: u32,
    #[serde(default, alias = "account_number", skip_serializing_if = "Option::is_none")]
    account_number: Option<String>,
}

impl Customer {
    pub fn new(
        id: u32,
        first_name: &str,
        last_name: &str,
        email: &str,
        gender: &str,
        age: u32,
    ) -> Self {
        Self {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            gender: gender.to_string(),
            age,
            account_number: None,
        }
    }

    pub fn with_account_number(mut self, account_number: &str) -> Self {
        self.account_number = Some(account_number.to_string());
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn account_number(&self) -> Option<&str> {
        self.account_number.as_deref()
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_string();
    }

    pub fn set_account_number(&mut self, account_number: &str) {
        self.account_number = Some(account_number.to_string());
    }

    /// Extract a single field as a dynamic item.
    pub fn field(&self, field: Field) -> Item {
        match field {
            Field::Id => Item::Int(i64::from(self.id)),
            Field::FirstName => Item::Text(self.first_name.clone()),
            Field::LastName => Item::Text(self.last_name.clone()),
            Field::Email => Item::Text(self.email.clone()),
            Field::Gender => Item::Text(self.gender.clone()),
            Field::Age => Item::Int(i64::from(self.age)),
            Field::AccountNumber => {
                Item::Text(self.account_number.clone().unwrap_or_default())
            }
        }
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Customer{{id={}, firstName='{}', lastName='{}', email='{}', gender='{}', age={}}}",
            self.id, self.first_name, self.last_name, self.email, self.gender, self.age
        )
    }
}

/// Named customer fields addressable from the pipeline DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    FirstName,
    LastName,
    Email,
    Gender,
    Age,
    AccountNumber,
}

impl Field {
    /// Look up a field by its DSL name (case-insensitive, `_` optional).
    pub fn parse(name: &str) -> Option<Field> {
        let key: String = name
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "id" => Some(Field::Id),
            "firstname" => Some(Field::FirstName),
            "lastname" => Some(Field::LastName),
            "email" => Some(Field::Email),
            "gender" => Some(Field::Gender),
            "age" => Some(Field::Age),
            "accountnumber" => Some(Field::AccountNumber),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::Email => "email",
            Field::Gender => "gender",
            Field::Age => "age",
            Field::AccountNumber => "account_number",
        }
    }

    /// Whether values of this field are numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Field::Id | Field::Age)
    }
}

/// A value flowing through a DSL pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Customer(Customer),
    Int(i64),
    Text(String),
}

impl Item {
    pub fn as_customer(&self) -> Option<&Customer> {
        match self {
            Item::Customer(c) => Some(c),
            _ => None,
        }
    }

    /// Natural order: ints numerically, texts lexicographically.
    ///
    /// Customers have no natural order, and ints never compare with texts.
    pub fn natural_cmp(&self, other: &Item) -> Option<Ordering> {
        match (self, other) {
            (Item::Int(a), Item::Int(b)) => Some(a.cmp(b)),
            (Item::Text(a), Item::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<Customer> for Item {
    fn from(customer: Customer) -> Self {
        Item::Customer(customer)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Customer(c) => write!(f, "{c}"),
            Item::Int(n) => write!(f, "{n}"),
            Item::Text(s) => write!(f, "{s}"),
        }
    }
}
