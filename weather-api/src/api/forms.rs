use super::ApiError;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// Decoded `application/x-www-form-urlencoded` fields. Also used for query
/// strings. A repeated key keeps its last value.
#[derive(Debug, Default)]
pub struct Form(HashMap<String, String>);

impl Form {
    pub fn parse(input: &[u8]) -> Self {
        Form(url::form_urlencoded::parse(input).into_owned().collect())
    }

    pub fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.0
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::BadRequest(format!("missing field: {name}")))
    }

    pub fn parse_field<T>(&self, name: &str) -> Result<T, ApiError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.required(name)?
            .trim()
            .parse()
            .map_err(|e| ApiError::BadRequest(format!("invalid value for {name}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectId;

    #[test]
    fn test_form_fields() {
        let form = Form::parse(b"name=Sao+Paulo&latitude=-23.55&min=abc&name=S%C3%A3o+Paulo");

        assert_eq!(form.required("name").unwrap(), "São Paulo");
        assert_eq!(form.parse_field::<f64>("latitude").unwrap(), -23.55);

        assert!(matches!(
            form.required("longitude"),
            Err(ApiError::BadRequest(msg)) if msg == "missing field: longitude"
        ));
        assert!(matches!(
            form.parse_field::<i64>("min"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            form.parse_field::<ObjectId>("name"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_empty_form() {
        let form = Form::parse(b"");
        assert!(form.required("name").is_err());
    }
}
