// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi, Param};
use alloy::primitives::{Address, Bytes};
use serde_json::Value as JsonValue;

/// A contract write call to resolve and encode against a provided ABI.
///
/// The method can be a bare name ("mint") or a full signature
/// ("mint(address,uint256)"); overloads are disambiguated by arity first and
/// by a trial encode when arity alone is ambiguous.
#[derive(Debug, Clone)]
pub struct ContractCall<'a> {
    pub contract_address: Address,
    pub method: &'a str,
    pub args: &'a [JsonValue],
    pub abi: &'a JsonAbi,
}

/// Encoded call data plus the resolved function, ready for transaction build.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    pub target: Address,
    pub call_data: Bytes,
    pub function: Function,
}

impl<'a> ContractCall<'a> {
    pub fn prepare(&self) -> Result<PreparedCall, AppError> {
        let function = self.resolve_function()?;
        let call_data = self.encode_parameters(&function)?;
        Ok(PreparedCall {
            target: self.contract_address,
            call_data: call_data.into(),
            function,
        })
    }

    fn resolve_function(&self) -> Result<Function, AppError> {
        let trimmed = self.method.trim();
        if trimmed.contains('(') {
            if let Ok(function) = Function::parse(trimmed) {
                if function.inputs.len() != self.args.len() {
                    return Err(AppError::validation(
                        "function_name",
                        format!(
                            "signature expects {} parameters, got {}",
                            function.inputs.len(),
                            self.args.len()
                        ),
                    ));
                }
                return Ok(function);
            }
        }
        self.resolve_from_abi(trimmed)
    }

    fn resolve_from_abi(&self, method: &str) -> Result<Function, AppError> {
        let name = method.split('(').next().unwrap_or(method).trim();

        let candidates: Vec<&Function> =
            self.abi.functions().filter(|f| f.name == name).collect();
        if candidates.is_empty() {
            return Err(AppError::validation(
                "function_name",
                format!("function '{}' not found in contract ABI", name),
            ));
        }

        let arity_matched: Vec<&Function> = candidates
            .into_iter()
            .filter(|f| f.inputs.len() == self.args.len())
            .collect();

        match arity_matched.len() {
            0 => Err(AppError::validation(
                "args",
                format!(
                    "no overload of '{}' takes {} parameters",
                    name,
                    self.args.len()
                ),
            )),
            1 => Ok(arity_matched[0].clone()),
            _ => arity_matched
                .into_iter()
                .find(|f| self.encode_parameters(f).is_ok())
                .cloned()
                .ok_or_else(|| {
                    AppError::validation(
                        "args",
                        format!("no overload of '{}' could encode the provided parameters", name),
                    )
                }),
        }
    }

    fn encode_parameters(&self, function: &Function) -> Result<Vec<u8>, AppError> {
        let values = json_to_sol(self.args, &function.inputs)
            .map_err(|e| AppError::validation("args", e))?;
        function
            .abi_encode_input(&values)
            .map_err(|e| AppError::validation("args", format!("ABI encoding failed: {}", e)))
    }
}

fn json_to_sol(json_values: &[JsonValue], params: &[Param]) -> Result<Vec<DynSolValue>, String> {
    if json_values.len() != params.len() {
        return Err(format!(
            "parameter count mismatch: expected {}, got {}",
            params.len(),
            json_values.len()
        ));
    }

    let mut parsed = Vec::with_capacity(params.len());
    for (value, param) in json_values.iter().zip(params.iter()) {
        if param.is_complex_type() {
            let inner = value
                .as_array()
                .ok_or_else(|| format!("expected array for tuple parameter '{}'", param.name))?;
            parsed.push(DynSolValue::Tuple(json_to_sol(inner, &param.components)?));
        } else {
            let sol_type: DynSolType = param
                .ty
                .parse()
                .map_err(|e| format!("invalid Solidity type '{}': {}", param.ty, e))?;
            let coerced = sol_type
                .coerce_json(value)
                .map_err(|e| format!("cannot coerce parameter '{}': {}", param.name, e))?;
            parsed.push(coerced);
        }
    }
    Ok(parsed)
}
