//! # Contract Verification
//!
//! A fail-fast gate run once per contract before any proxy is created from it. A contract that
//! passes can be dispatched without the dispatcher ever meeting an operation with a missing
//! verb, a missing route template or an unrecognized return type.
use super::{Operation, ServiceContract};
use crate::error::ConfigurationError;
use std::collections::HashSet;

/// Checks every rule a contract must satisfy to be proxied.
///
/// # Returns
///
/// * `Ok(())` - The contract can be dispatched.
/// * `Err(ConfigurationError)` - The first violated rule, naming the contract and operation.
pub fn verify(contract: &ServiceContract) -> Result<(), ConfigurationError> {
    if !is_identifier(&contract.name) {
        return Err(invalid_contract(
            contract,
            "the name must be a non-empty identifier",
        ));
    }

    let mut seen = HashSet::new();
    for operation in &contract.operations {
        if !seen.insert(operation.name.as_str()) {
            return Err(invalid_contract(
                contract,
                format!("operation '{}' is declared more than once", operation.name),
            ));
        }
        verify_operation(contract, operation)?;
    }

    Ok(())
}

fn verify_operation(
    contract: &ServiceContract,
    operation: &Operation,
) -> Result<(), ConfigurationError> {
    if !is_identifier(&operation.name) {
        return Err(invalid_operation(
            contract,
            operation,
            "the name must be a non-empty identifier",
        ));
    }

    match operation.verbs.len() {
        1 => {}
        0 => {
            return Err(invalid_operation(
                contract,
                operation,
                "no HTTP verb declared",
            ));
        }
        n => {
            return Err(invalid_operation(
                contract,
                operation,
                format!("{n} HTTP verbs declared, expected exactly one"),
            ));
        }
    }

    if contract.route_template(operation).is_none() {
        return Err(invalid_operation(
            contract,
            operation,
            "no route template declared and the contract declares none",
        ));
    }

    if let Some(result) = operation.returns.result_type()
        && !result.is_action_result()
    {
        return Err(invalid_operation(
            contract,
            operation,
            format!("unsupported return type {result:?}, expected an action result"),
        ));
    }

    if let Some(parameter) = operation
        .parameters
        .iter()
        .find(|p| !is_identifier(&p.name))
    {
        return Err(invalid_operation(
            contract,
            operation,
            format!(
                "parameter name '{}' must be a non-empty identifier",
                parameter.name
            ),
        ));
    }

    let bodies = operation.parameters.iter().filter(|p| p.is_body()).count();
    if bodies > 1 {
        return Err(invalid_operation(
            contract,
            operation,
            format!("{bodies} body parameters declared, at most one is allowed"),
        ));
    }

    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn invalid_contract(contract: &ServiceContract, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidContract {
        contract: contract.name.clone(),
        reason: reason.into(),
    }
}

fn invalid_operation(
    contract: &ServiceContract,
    operation: &Operation,
    reason: impl Into<String>,
) -> ConfigurationError {
    ConfigurationError::InvalidOperation {
        contract: contract.name.clone(),
        operation: operation.name.clone(),
        reason: reason.into(),
    }
}
