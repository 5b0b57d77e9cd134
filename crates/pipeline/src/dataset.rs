use credit_models::{Feature, RiskError};
use std::path::Path;
use tracing::{info, instrument};

/// ARFF token for a missing value.
const MISSING: &str = "?";

/// Name of the label column in credit-g.
pub const TARGET_COLUMN: &str = "class";

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    Numeric,
    Nominal(Vec<String>),
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

/// A dense ARFF table.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub relation: String,
    pub attributes: Vec<Attribute>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

/// Feature columns in model order plus binary labels (`bad` = 1).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub columns: Vec<(Feature, Column)>,
    pub target: Vec<usize>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn column(&self, feature: Feature) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, column)| column)
    }
}

fn invalid(reason: impl Into<String>) -> RiskError {
    RiskError::InvalidDataset {
        reason: reason.into(),
    }
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RiskError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            invalid(format!("failed to read {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_arff(&text)?;
        info!(
            path = %path.display(),
            relation = %dataset.relation,
            rows = dataset.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Downloads an ARFF document, optionally writing it to `cache` first.
    #[instrument(skip(cache))]
    pub async fn fetch(url: &str, cache: Option<&Path>) -> Result<Self, RiskError> {
        info!("Downloading dataset");
        let response = reqwest::get(url)
            .await
            .map_err(|e| RiskError::Download { reason: e.to_string() })?;
        if !response.status().is_success() {
            return Err(RiskError::Download {
                reason: format!("{} returned {}", url, response.status()),
            });
        }
        let text = response
            .text()
            .await
            .map_err(|e| RiskError::Download { reason: e.to_string() })?;

        if let Some(cache) = cache {
            if let Some(parent) = cache.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RiskError::Download { reason: e.to_string() })?;
            }
            tokio::fs::write(cache, &text)
                .await
                .map_err(|e| RiskError::Download { reason: e.to_string() })?;
            info!(path = %cache.display(), "Dataset cached");
        }

        Self::from_arff(&text)
    }

    pub fn from_arff(text: &str) -> Result<Self, RiskError> {
        let mut relation = String::new();
        let mut attributes = Vec::new();
        let mut rows = Vec::new();
        let mut in_data = false;

        for (line_no, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }
            let at = |reason: String| invalid(format!("line {}: {}", line_no + 1, reason));

            if in_data {
                if line.starts_with('{') {
                    return Err(at("sparse ARFF rows are not supported".to_string()));
                }
                let tokens = split_values(line).map_err(at)?;
                if tokens.len() != attributes.len() {
                    return Err(at(format!(
                        "expected {} values, found {}",
                        attributes.len(),
                        tokens.len()
                    )));
                }
                let row = attributes
                    .iter()
                    .zip(tokens)
                    .map(|(attribute, token)| parse_value(attribute, token))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(at)?;
                rows.push(row);
                continue;
            }

            let (keyword, rest) = split_keyword(line);
            match keyword.to_ascii_lowercase().as_str() {
                "@relation" => relation = unquote(rest.trim()).to_string(),
                "@attribute" => attributes.push(parse_attribute(rest).map_err(at)?),
                "@data" => in_data = true,
                other => return Err(at(format!("unexpected header line '{}'", other))),
            }
        }

        if !in_data {
            return Err(invalid("missing @data section"));
        }
        if attributes.is_empty() {
            return Err(invalid("no attributes declared"));
        }

        Ok(Self {
            relation,
            attributes,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Extracts the model features and the `good`/`bad` target.
    ///
    /// Missing numeric cells take the column mean; missing categorical cells
    /// become the category `?`.
    pub fn select(&self, features: &[Feature], target: &str) -> Result<Frame, RiskError> {
        let target_index = self
            .column_index(target)
            .ok_or_else(|| invalid(format!("target column '{}' not found", target)))?;
        let labels = self
            .rows
            .iter()
            .enumerate()
            .map(|(row, values)| match &values[target_index] {
                Value::Text(label) if label == "good" => Ok(0),
                Value::Text(label) if label == "bad" => Ok(1),
                other => Err(invalid(format!(
                    "row {}: unexpected target value {:?}",
                    row + 1,
                    other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut columns = Vec::with_capacity(features.len());
        for &feature in features {
            let index = self
                .column_index(feature.name())
                .ok_or_else(|| invalid(format!("feature column '{}' not found", feature)))?;
            let column = if feature.is_categorical() {
                Column::Categorical(self.rows.iter().map(|r| r[index].to_label()).collect())
            } else {
                Column::Numeric(self.numeric_column(index, feature)?)
            };
            columns.push((feature, column));
        }

        Ok(Frame {
            columns,
            target: labels,
        })
    }

    fn numeric_column(&self, index: usize, feature: Feature) -> Result<Vec<f64>, RiskError> {
        let mut values = Vec::with_capacity(self.rows.len());
        for (row, cells) in self.rows.iter().enumerate() {
            match &cells[index] {
                Value::Number(v) => values.push(Some(*v)),
                Value::Missing => values.push(None),
                Value::Text(text) => {
                    return Err(invalid(format!(
                        "row {}: '{}' is not numeric for {}",
                        row + 1,
                        text,
                        feature
                    )))
                }
            }
        }

        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return Err(invalid(format!("column {} has no values", feature)));
        }
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        Ok(values.into_iter().map(|v| v.unwrap_or(mean)).collect())
    }
}

impl Value {
    fn to_label(&self) -> String {
        match self {
            Value::Text(text) => text.clone(),
            Value::Number(v) => v.to_string(),
            Value::Missing => MISSING.to_string(),
        }
    }
}

fn split_keyword(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], &line[pos..]),
        None => (line, ""),
    }
}

fn parse_attribute(rest: &str) -> Result<Attribute, String> {
    let rest = rest.trim();
    let (name, kind_text) = match rest.chars().next() {
        Some(quote @ ('\'' | '"')) => {
            let end = rest[1..]
                .find(quote)
                .ok_or_else(|| "unterminated attribute name".to_string())?;
            (&rest[1..=end], &rest[end + 2..])
        }
        Some(_) => split_keyword(rest),
        None => return Err("attribute without a name".to_string()),
    };
    let kind_text = kind_text.trim();

    let kind = if let Some(inner) = kind_text.strip_prefix('{') {
        let inner = inner
            .strip_suffix('}')
            .ok_or_else(|| "unterminated nominal list".to_string())?;
        let values = split_values(inner)?
            .into_iter()
            .map(|token| token.unwrap_or_else(|| MISSING.to_string()))
            .collect();
        AttributeKind::Nominal(values)
    } else {
        match kind_text.to_ascii_lowercase().as_str() {
            "numeric" | "real" | "integer" => AttributeKind::Numeric,
            "string" => AttributeKind::Text,
            other if other.starts_with("date") => AttributeKind::Text,
            other => return Err(format!("unsupported attribute type '{}'", other)),
        }
    };

    Ok(Attribute {
        name: name.to_string(),
        kind,
    })
}

fn parse_value(attribute: &Attribute, token: Option<String>) -> Result<Value, String> {
    let Some(token) = token else {
        return Ok(Value::Missing);
    };
    match &attribute.kind {
        AttributeKind::Numeric => token
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| format!("'{}' is not numeric for {}", token, attribute.name)),
        AttributeKind::Nominal(allowed) => {
            if allowed.iter().any(|v| *v == token) {
                Ok(Value::Text(token))
            } else {
                Err(format!("'{}' is not a declared value of {}", token, attribute.name))
            }
        }
        AttributeKind::Text => Ok(Value::Text(token)),
    }
}

/// Splits a comma separated ARFF row. Unquoted `?` yields `None`.
fn split_values(line: &str) -> Result<Vec<Option<String>>, String> {
    let mut values = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let value = match chars.peek().copied() {
            Some(quote @ ('\'' | '"')) => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                text.push(escaped);
                            }
                        }
                        Some(c) if c == quote => break,
                        Some(c) => text.push(c),
                        None => return Err("unterminated quoted value".to_string()),
                    }
                }
                Some(text)
            }
            _ => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    text.push(c);
                    chars.next();
                }
                let text = text.trim().to_string();
                (text != MISSING).then_some(text)
            }
        };
        values.push(value);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(c) => return Err(format!("unexpected '{}' after value", c)),
        }
    }

    Ok(values)
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
% German credit excerpt
@relation 'german_credit'
@attribute checking_status { '<0', '0<=X<200', '>=200', 'no checking'}
@attribute duration real
@attribute purpose { 'new car', 'used car', radio/tv}
@attribute 'credit_amount' numeric
@attribute class { good, bad}
@data
'<0',6,radio/tv,1169,good
'0<=X<200',48,'used car',?,bad
'no checking', 12 ,'new car',2096,good
"#;

    #[test]
    fn parses_header_and_rows() {
        let dataset = Dataset::from_arff(SAMPLE).unwrap();
        assert_eq!(dataset.relation, "german_credit");
        assert_eq!(dataset.attributes.len(), 5);
        assert_eq!(dataset.len(), 3);
        assert_eq!(
            dataset.attributes[0].kind,
            AttributeKind::Nominal(vec![
                "<0".to_string(),
                "0<=X<200".to_string(),
                ">=200".to_string(),
                "no checking".to_string()
            ])
        );
        assert_eq!(dataset.attributes[3].name, "credit_amount");
        assert_eq!(dataset.rows[1][2], Value::Text("used car".to_string()));
        assert_eq!(dataset.rows[1][3], Value::Missing);
        assert_eq!(dataset.rows[2][1], Value::Number(12.0));
    }

    #[test]
    fn undeclared_nominal_value_is_an_error() {
        let text = "@relation r\n@attribute a {x, y}\n@data\nz\n";
        let err = Dataset::from_arff(text).unwrap_err();
        assert!(err.to_string().contains("line 4"));
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let text = "@relation r\n@attribute a numeric\n@attribute b numeric\n@data\n1\n";
        assert!(matches!(
            Dataset::from_arff(text),
            Err(RiskError::InvalidDataset { .. })
        ));
    }

    #[test]
    fn sparse_rows_are_rejected() {
        let text = "@relation r\n@attribute a numeric\n@data\n{0 1}\n";
        assert!(Dataset::from_arff(text).is_err());
    }

    #[test]
    fn missing_data_section_is_an_error() {
        assert!(Dataset::from_arff("@relation r\n@attribute a numeric\n").is_err());
    }

    #[test]
    fn split_values_handles_quotes_and_escapes() {
        let values = split_values(r#"'a,b', "it\'s" , plain, ?"#).unwrap();
        assert_eq!(
            values,
            vec![
                Some("a,b".to_string()),
                Some("it's".to_string()),
                Some("plain".to_string()),
                None
            ]
        );
    }

    #[test]
    fn select_imputes_numeric_and_maps_target() {
        let dataset = Dataset::from_arff(SAMPLE).unwrap();
        let frame = dataset
            .select(
                &[Feature::Duration, Feature::CreditAmount, Feature::CheckingStatus],
                TARGET_COLUMN,
            )
            .unwrap();

        assert_eq!(frame.target, vec![0, 1, 0]);
        assert_eq!(
            frame.column(Feature::CreditAmount),
            Some(&Column::Numeric(vec![1169.0, 1632.5, 2096.0]))
        );
        assert_eq!(
            frame.column(Feature::CheckingStatus),
            Some(&Column::Categorical(vec![
                "<0".to_string(),
                "0<=X<200".to_string(),
                "no checking".to_string()
            ]))
        );
    }

    #[test]
    fn select_reports_missing_columns() {
        let dataset = Dataset::from_arff(SAMPLE).unwrap();
        let err = dataset.select(&[Feature::Age], TARGET_COLUMN).unwrap_err();
        assert!(err.to_string().contains("age"));
    }
}
