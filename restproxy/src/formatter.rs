use colored::*;
use restproxy_core::route::controller_name;
use restproxy_core::{
    ActionResult, ConfigurationError, Operation, ProxyError, ReturnShape, ServiceContract,
};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<ActionResult<serde_json::Value>> for FormattedString {
    fn from(result: ActionResult<serde_json::Value>) -> Self {
        let status = match result.status {
            Some(status) => status.to_string().green().to_string(),
            None => "no status".yellow().to_string(),
        };

        match result.value {
            Some(value) => FormattedString(format!(
                "{} {}\n\n{}",
                "Status:".bold(),
                status,
                FormattedString::from(value).0
            )),
            None => FormattedString(format!("{} {}", "Status:".bold(), status)),
        }
    }
}

impl From<ProxyError> for FormattedString {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::Configuration(err) => FormattedString::from(err),
            ProxyError::Remote(err) => {
                let status = err
                    .status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "none".to_string());
                FormattedString(format!(
                    "{} status={} message={:?}",
                    "Call Failed:".red().bold(),
                    status,
                    err.message
                ))
            }
        }
    }
}

impl From<ConfigurationError> for FormattedString {
    fn from(err: ConfigurationError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Invalid Configuration:".red().bold(),
            err
        ))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<&ServiceContract> for FormattedString {
    fn from(contract: &ServiceContract) -> Self {
        if contract.operations.is_empty() {
            return FormattedString(
                format!("{} declares no operations.", contract.name)
                    .yellow()
                    .to_string(),
            );
        }

        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {{\n",
            "contract".cyan(),
            contract.name.green()
        ));

        for operation in &contract.operations {
            out.push_str("  ");
            out.push_str(&format_operation(contract, operation));
            out.push('\n');
        }

        out.push('}');
        FormattedString(out)
    }
}

fn format_operation(contract: &ServiceContract, operation: &Operation) -> String {
    let verb = operation
        .verb()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "?".to_string());

    let route = contract
        .route_template(operation)
        .unwrap_or_default()
        .replace("[action]", &operation.name)
        .replace("[controller]", controller_name(&contract.name));

    let params: Vec<String> = operation
        .parameters
        .iter()
        .map(|p| {
            let source = if p.is_body() {
                "body"
            } else if p.is_query() {
                "query"
            } else {
                "route"
            };
            format!("{}: {} {}", p.name, p.type_name.yellow(), source.dimmed())
        })
        .collect();

    let returns = match &operation.returns {
        ReturnShape::AsyncUnit => "()".to_string(),
        shape => shape
            .result_type()
            .and_then(|r| r.payload())
            .unwrap_or("()")
            .to_string(),
    };

    format!(
        "{} {} {}({}) -> {}",
        verb.cyan().bold(),
        route,
        operation.name.green(),
        params.join(", "),
        returns.yellow()
    )
}
