use serde::{Deserialize, Serialize};

/// Attribute types a feature store understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
  Boolean,
  Int,
  Date,
  String,
  Float,
}

/// Maps an XML schema type name to a field type.
#[must_use]
pub fn field_type(xsd_type: &str) -> Option<FieldType> {
  match xsd_type {
    "xsd:boolean" => Some(FieldType::Boolean),
    "xsd:int" | "xsd:integer" | "xsd:short" | "xsd:long" => Some(FieldType::Int),
    "xsd:date" => Some(FieldType::Date),
    "xsd:string" => Some(FieldType::String),
    "xsd:float" | "xsd:double" => Some(FieldType::Float),
    _ => None,
  }
}

/// One attribute as described by the layer's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
  pub name: String,
  pub xsd_type: String,
}

/// Describes the feature type behind a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
  pub url: String,
  pub feature_type: String,
  pub feature_ns: String,
  pub attributes: Vec<AttributeDef>,
}

/// A store column. Unknown schema types have no field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
  pub name: String,
  pub field_type: Option<FieldType>,
}

impl Schema {
  #[must_use]
  pub fn fields(&self) -> Vec<Field> {
    self
      .attributes
      .iter()
      .map(|a| Field {
        name: a.name.clone(),
        field_type: field_type(&a.xsd_type),
      })
      .collect()
  }
}
