//! Request payload validation.
//!
//! Payload fields are kept as raw JSON so that a wrong type is reported per
//! field instead of failing deserialization of the whole body. Each payload
//! converts into a typed request, or into [`ValidationErrors`] listing every
//! offending field.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use threadline_core::{Price, ProductId};

use crate::models::{AddToCart, MAX_LINE_QUANTITY, NewProduct, UpdateLine, normalize_tokens};

/// Hex, `rgb()` or `hsl()` color notation.
static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(#(?:[0-9a-f]{3}){1,2}$)|^rgb\((\s*\d+\s*,){2}\s*\d+\s*\)$|^hsl\((\s*\d+\s*,\s*\d+%?,\s*\d+%?)\)$",
    )
    .expect("Invalid regex")
});

/// Field-level validation failures, serialized as `{field: [message, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("validation failed")]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single failure for `field`.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn field(&self, field: &str) -> &[String] {
        self.errors.get(field).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first message recorded, used as the response summary.
    #[must_use]
    pub fn first_message(&self) -> Option<&str> {
        self.errors
            .values()
            .flat_map(|messages| messages.first())
            .map(String::as_str)
            .next()
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, Self> {
        match value {
            Some(value) if self.is_empty() => Ok(value),
            _ => Err(self),
        }
    }
}

/// Body of add-to-cart and full line updates.
#[derive(Debug, Default, Deserialize)]
pub struct CartLinePayload {
    pub product_id: Option<Value>,
    pub quantity: Option<Value>,
    pub size: Option<Value>,
    pub color: Option<Value>,
}

impl CartLinePayload {
    /// Validate an add-to-cart request.
    ///
    /// # Errors
    ///
    /// Returns every field that is missing or malformed.
    pub fn into_add(self) -> Result<AddToCart, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let product_id = product_id(self.product_id.as_ref(), &mut errors);
        let line = line_fields(self.quantity.as_ref(), self.size.as_ref(), self.color.as_ref(), &mut errors);

        let request = product_id.zip(line).map(|(product_id, line)| AddToCart {
            product_id,
            quantity: line.quantity,
            size: line.size,
            color: line.color,
        });
        errors.finish(request)
    }

    /// Validate a full line update. `product_id` is not required.
    ///
    /// # Errors
    ///
    /// Returns every field that is missing or malformed.
    pub fn into_update(self) -> Result<UpdateLine, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let line = line_fields(self.quantity.as_ref(), self.size.as_ref(), self.color.as_ref(), &mut errors);
        errors.finish(line)
    }
}

/// Body of a quantity-only update.
#[derive(Debug, Default, Deserialize)]
pub struct QuantityPayload {
    pub quantity: Option<Value>,
}

impl QuantityPayload {
    /// # Errors
    ///
    /// Returns the quantity failure if it is missing or malformed.
    pub fn into_quantity(self) -> Result<u32, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let quantity = quantity(self.quantity.as_ref(), &mut errors);
        errors.finish(quantity)
    }
}

/// Body of a product creation request.
#[derive(Debug, Default, Deserialize)]
pub struct ProductPayload {
    pub product_name: Option<Value>,
    pub brand: Option<Value>,
    pub custom_brand: Option<Value>,
    pub price: Option<Value>,
    pub size: Option<Value>,
    pub colors: Option<Value>,
}

const REQUIRED: &str = "This field is required";
const INVALID: &str = "Invalid inputs";

impl ProductPayload {
    /// Validate a product creation request.
    ///
    /// # Errors
    ///
    /// Returns every field that is missing or malformed.
    pub fn into_product(self) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = match self.product_name.as_ref() {
            None | Some(Value::Null) => {
                errors.add("product_name", REQUIRED);
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                errors.add("product_name", REQUIRED);
                None
            }
            Some(Value::String(s)) => Some(s.trim().to_owned()),
            Some(_) => {
                errors.add("product_name", INVALID);
                None
            }
        };

        let brand = [self.brand.as_ref(), self.custom_brand.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|v| v.as_str().map(str::trim).filter(|s| !s.is_empty()));
        if brand.is_none() {
            errors.add("brand", REQUIRED);
        }

        let price = match self.price.as_ref() {
            None | Some(Value::Null) => {
                errors.add("price", REQUIRED);
                None
            }
            Some(value) => {
                let raw = match value {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                };
                let price = raw.and_then(|raw| Price::parse(&raw).ok());
                if price.is_none() {
                    errors.add("price", "Invalid inputs. format: 12.54 etc only allowed");
                }
                price
            }
        };

        // Listed order feeds the SKU, so sizes are not sorted.
        let size = string_list(self.size.as_ref(), "size", REQUIRED, INVALID, &mut errors)
            .map(ordered_tokens);
        if size.as_ref().is_some_and(Vec::is_empty) {
            errors.add("size", REQUIRED);
        }

        let colors = string_set(self.colors.as_ref(), "colors", REQUIRED, INVALID, &mut errors);
        match &colors {
            Some(c) if c.is_empty() => errors.add("colors", "Please select at least one color."),
            Some(c) if !c.iter().all(|c| COLOR_RE.is_match(c)) => errors.add("colors", INVALID),
            _ => {}
        }

        let product = match (name, brand, price, size, colors) {
            (Some(name), Some(brand), Some(price), Some(size), Some(color)) => Some(NewProduct {
                name,
                brand: brand.to_owned(),
                price,
                size,
                color,
            }),
            _ => None,
        };
        errors.finish(product)
    }
}

/// Parse an integer from a JSON number or a numeric string.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn product_id(value: Option<&Value>, errors: &mut ValidationErrors) -> Option<ProductId> {
    match value {
        None | Some(Value::Null) => {
            errors.add("product_id", "Product is required");
            None
        }
        Some(value) => {
            let id = integer(value)
                .and_then(|id| i32::try_from(id).ok())
                .filter(|id| *id > 0)
                .map(ProductId::new);
            if id.is_none() {
                errors.add("product_id", "Product was not found");
            }
            id
        }
    }
}

fn quantity(value: Option<&Value>, errors: &mut ValidationErrors) -> Option<u32> {
    let value = match value {
        None | Some(Value::Null) => {
            errors.add("quantity", "Product quantity is required");
            return None;
        }
        Some(value) => value,
    };

    match integer(value) {
        None => {
            errors.add("quantity", "Select the correct quantity");
            None
        }
        Some(q) if q < 1 => {
            errors.add("quantity", "Quantity should be at least one(1)");
            None
        }
        Some(q) => {
            let q = u32::try_from(q).ok().filter(|q| *q <= MAX_LINE_QUANTITY);
            if q.is_none() {
                errors.add("quantity", "Select the correct quantity");
            }
            q
        }
    }
}

/// A non-null JSON array of strings, normalized into set form.
fn string_set(
    value: Option<&Value>,
    field: &'static str,
    required: &str,
    invalid: &str,
    errors: &mut ValidationErrors,
) -> Option<Vec<String>> {
    string_list(value, field, required, invalid, errors).map(normalize_tokens)
}

/// Trim and drop blank or repeated tokens, keeping the first occurrence in place.
fn ordered_tokens(tokens: Vec<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens.into_iter().map(str::trim).filter(|t| !t.is_empty()) {
        if !out.iter().any(|seen| seen == token) {
            out.push(token.to_owned());
        }
    }
    out
}

fn string_list<'a>(
    value: Option<&'a Value>,
    field: &'static str,
    required: &str,
    invalid: &str,
    errors: &mut ValidationErrors,
) -> Option<Vec<&'a str>> {
    let items = match value {
        None | Some(Value::Null) => {
            errors.add(field, required);
            return None;
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.add(field, invalid);
            return None;
        }
    };

    let strings: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
    if strings.is_none() {
        errors.add(field, invalid);
    }
    strings
}

fn line_fields(
    quantity_value: Option<&Value>,
    size_value: Option<&Value>,
    color_value: Option<&Value>,
    errors: &mut ValidationErrors,
) -> Option<UpdateLine> {
    let quantity = quantity(quantity_value, errors);

    let size = string_set(
        size_value,
        "size",
        "Product size is required",
        "Select the correct size",
        errors,
    );
    if size.as_ref().is_some_and(Vec::is_empty) {
        errors.add("size", "Select at least one(1) size");
    }

    let color = string_set(
        color_value,
        "color",
        "Product color is required",
        "Select the correct color",
        errors,
    );
    match &color {
        Some(c) if c.is_empty() => errors.add("color", "Select at least one(1) color"),
        Some(c) if !c.iter().all(|c| COLOR_RE.is_match(c)) => {
            errors.add("color", "Select the correct color");
        }
        _ => {}
    }

    Some(UpdateLine {
        quantity: quantity?,
        size: size?,
        color: color?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cart_payload(value: Value) -> CartLinePayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_add_accepts_numeric_strings_and_normalizes_sets() {
        let request = cart_payload(json!({
            "product_id": "5",
            "quantity": 2,
            "size": ["M", " S", "M"],
            "color": ["#000000"]
        }))
        .into_add()
        .unwrap();

        assert_eq!(request.product_id, ProductId::new(5));
        assert_eq!(request.quantity, 2);
        assert_eq!(request.size, vec!["M".to_string(), "S".to_string()]);
    }

    #[test]
    fn test_add_reports_every_missing_field() {
        let errors = cart_payload(json!({})).into_add().unwrap_err();
        assert_eq!(errors.field("product_id"), ["Product is required"]);
        assert_eq!(errors.field("quantity"), ["Product quantity is required"]);
        assert_eq!(errors.field("size"), ["Product size is required"]);
        assert_eq!(errors.field("color"), ["Product color is required"]);
    }

    #[test]
    fn test_quantity_rules() {
        let check = |quantity: Value| {
            QuantityPayload {
                quantity: Some(quantity),
            }
            .into_quantity()
        };

        assert_eq!(check(json!(3)).unwrap(), 3);
        assert_eq!(check(json!("4")).unwrap(), 4);
        assert_eq!(
            check(json!(0)).unwrap_err().field("quantity"),
            ["Quantity should be at least one(1)"]
        );
        assert_eq!(
            check(json!("two")).unwrap_err().field("quantity"),
            ["Select the correct quantity"]
        );
        assert_eq!(
            check(json!(1.5)).unwrap_err().field("quantity"),
            ["Select the correct quantity"]
        );
        assert!(check(json!(i64::from(i32::MAX) + 1)).is_err());
    }

    #[test]
    fn test_color_syntax() {
        for color in ["#fff", "#A1B2C3", "rgb(1, 2, 3)", "hsl(120, 50%, 50%)", "RGB(0,0,0)"] {
            assert!(COLOR_RE.is_match(color), "{color} should be accepted");
        }
        for color in ["red", "#ffff", "rgb(1,2)", "hsl(a, b, c)"] {
            assert!(!COLOR_RE.is_match(color), "{color} should be rejected");
        }
    }

    #[test]
    fn test_empty_sets_are_rejected() {
        let errors = cart_payload(json!({
            "product_id": 1,
            "quantity": 1,
            "size": [" "],
            "color": []
        }))
        .into_add()
        .unwrap_err();

        assert_eq!(errors.field("size"), ["Select at least one(1) size"]);
        assert_eq!(errors.field("color"), ["Select at least one(1) color"]);
    }

    #[test]
    fn test_non_string_tokens_are_rejected() {
        let errors = cart_payload(json!({
            "quantity": 1,
            "size": [1, 2],
            "color": "#000"
        }))
        .into_update()
        .unwrap_err();

        assert_eq!(errors.field("size"), ["Select the correct size"]);
        assert_eq!(errors.field("color"), ["Select the correct color"]);
        assert!(errors.field("product_id").is_empty());
    }

    #[test]
    fn test_product_payload() {
        let payload: ProductPayload = serde_json::from_value(json!({
            "product_name": "Red Cotton Shirt",
            "custom_brand": "Acme",
            "price": "19.99",
            "size": ["M", "L"],
            "colors": ["#ff0000"]
        }))
        .unwrap();

        let product = payload.into_product().unwrap();
        assert_eq!(product.name, "Red Cotton Shirt");
        assert_eq!(product.brand, "Acme");
        assert_eq!(product.price.to_string(), "19.99");
        assert_eq!(product.size, vec!["M".to_string(), "L".to_string()]);
    }

    #[test]
    fn test_product_sizes_keep_listed_order() {
        let payload: ProductPayload = serde_json::from_value(json!({
            "product_name": "Red Cotton Shirt",
            "brand": "Acme",
            "price": 19,
            "size": ["XL", " M ", "", "XL"],
            "colors": ["#ff0000"]
        }))
        .unwrap();

        let product = payload.into_product().unwrap();
        assert_eq!(product.size, vec!["XL".to_string(), "M".to_string()]);
    }

    #[test]
    fn test_product_payload_rejects_bad_price_and_missing_brand() {
        let payload: ProductPayload = serde_json::from_value(json!({
            "product_name": "Shirt",
            "price": "12.345",
            "size": ["M"],
            "colors": ["#ff0000"]
        }))
        .unwrap();

        let errors = payload.into_product().unwrap_err();
        assert_eq!(
            errors.field("price"),
            ["Invalid inputs. format: 12.54 etc only allowed"]
        );
        assert_eq!(errors.field("brand"), [REQUIRED]);
    }

    #[test]
    fn test_errors_serialize_as_field_map() {
        let errors = ValidationErrors::single("quantity", "Select the correct quantity");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"quantity": ["Select the correct quantity"]})
        );
        assert_eq!(errors.first_message(), Some("Select the correct quantity"));
    }
}
