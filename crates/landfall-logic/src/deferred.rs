//! Deferred calls: durable "function name + arguments" records.
//!
//! Activity result actions are stored as [`DeferredCall`]s and only turned
//! back into something invocable when the activity completes, possibly after
//! a save/load cycle. Functions are looked up by stable string name in a
//! [`CallRegistry`]; arguments are a closed tagged union that can itself hold
//! nested calls, which are resolved depth-first before the outer call runs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building, decoding or invoking deferred calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeferredError {
    #[error("unknown deferred function `{0}`")]
    UnknownFunction(String),
    #[error("value is not a deferred call: {0}")]
    NotCallable(String),
    #[error("argument {index} of `{function}` must be {expected}")]
    BadArgument {
        function: String,
        index: usize,
        expected: &'static str,
    },
    #[error("deferred function `{function}` failed: {reason}")]
    Failed { function: String, reason: String },
}

/// A single positional argument.
///
/// Entities are carried as raw 64-bit handles so the logic crate stays
/// independent of the ECS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallArg {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Entity(u64),
    List(Vec<CallArg>),
    Call(Box<DeferredCall>),
}

impl CallArg {
    pub fn kind(&self) -> &'static str {
        match self {
            CallArg::Null => "null",
            CallArg::Bool(_) => "bool",
            CallArg::Int(_) => "int",
            CallArg::Float(_) => "float",
            CallArg::Text(_) => "text",
            CallArg::Entity(_) => "entity",
            CallArg::List(_) => "list",
            CallArg::Call(_) => "call",
        }
    }
}

impl From<bool> for CallArg {
    fn from(v: bool) -> Self {
        CallArg::Bool(v)
    }
}

impl From<i64> for CallArg {
    fn from(v: i64) -> Self {
        CallArg::Int(v)
    }
}

impl From<f64> for CallArg {
    fn from(v: f64) -> Self {
        CallArg::Float(v)
    }
}

impl From<&str> for CallArg {
    fn from(v: &str) -> Self {
        CallArg::Text(v.to_string())
    }
}

impl From<String> for CallArg {
    fn from(v: String) -> Self {
        CallArg::Text(v)
    }
}

impl From<DeferredCall> for CallArg {
    fn from(call: DeferredCall) -> Self {
        CallArg::Call(Box::new(call))
    }
}

/// A function reference by name plus its positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredCall {
    pub function: String,
    pub args: Vec<CallArg>,
}

impl DeferredCall {
    /// Build a call without checking the name against a registry.
    /// Prefer [`CallRegistry::serialize`] outside of tests and fixtures.
    pub fn new(function: impl Into<String>, args: Vec<CallArg>) -> Self {
        Self {
            function: function.into(),
            args,
        }
    }

    /// Decode a call from its stored JSON form.
    pub fn decode(value: &serde_json::Value) -> Result<Self, DeferredError> {
        serde_json::from_value(value.clone()).map_err(|e| DeferredError::NotCallable(e.to_string()))
    }

    pub fn encode(&self) -> serde_json::Value {
        // Every variant maps onto plain JSON; non-finite floats become null.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Names of this call and every nested call, outermost first.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names = vec![self.function.as_str()];
        for arg in &self.args {
            collect_names(arg, &mut names);
        }
        names
    }
}

fn collect_names<'a>(arg: &'a CallArg, names: &mut Vec<&'a str>) {
    match arg {
        CallArg::Call(call) => names.extend(call.function_names()),
        CallArg::List(items) => {
            for item in items {
                collect_names(item, names);
            }
        }
        _ => {}
    }
}

impl fmt::Display for DeferredCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} args)", self.function, self.args.len())
    }
}

/// Fully resolved arguments handed to a registered function.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArgs {
    function: String,
    values: Vec<CallArg>,
}

impl CallArgs {
    pub fn new(function: impl Into<String>, values: Vec<CallArg>) -> Self {
        Self {
            function: function.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CallArg> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[CallArg] {
        &self.values
    }

    fn bad(&self, index: usize, expected: &'static str) -> DeferredError {
        DeferredError::BadArgument {
            function: self.function.clone(),
            index,
            expected,
        }
    }

    pub fn entity(&self, index: usize) -> Result<u64, DeferredError> {
        match self.get(index) {
            Some(CallArg::Entity(bits)) => Ok(*bits),
            _ => Err(self.bad(index, "an entity")),
        }
    }

    pub fn text(&self, index: usize) -> Result<&str, DeferredError> {
        match self.get(index) {
            Some(CallArg::Text(s)) => Ok(s),
            _ => Err(self.bad(index, "text")),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64, DeferredError> {
        match self.get(index) {
            Some(CallArg::Int(v)) => Ok(*v),
            _ => Err(self.bad(index, "an integer")),
        }
    }

    /// Accepts integers as well as floats.
    pub fn float(&self, index: usize) -> Result<f64, DeferredError> {
        match self.get(index) {
            Some(CallArg::Float(v)) => Ok(*v),
            Some(CallArg::Int(v)) => Ok(*v as f64),
            _ => Err(self.bad(index, "a number")),
        }
    }

    /// Build a `Failed` error attributed to this call.
    pub fn fail(&self, reason: impl Into<String>) -> DeferredError {
        DeferredError::Failed {
            function: self.function.clone(),
            reason: reason.into(),
        }
    }
}

/// Signature of a registered function. `C` is the mutable context the call
/// runs against (the world, in the simulation core).
pub type DeferredFn<C> = Box<dyn Fn(&mut C, &CallArgs) -> Result<CallArg, DeferredError>>;

/// Stable name → function table.
pub struct CallRegistry<C> {
    functions: BTreeMap<String, DeferredFn<C>>,
}

impl<C> Default for CallRegistry<C> {
    fn default() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }
}

impl<C> fmt::Debug for CallRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<C> CallRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&mut C, &CallArgs) -> Result<CallArg, DeferredError> + 'static,
    {
        self.functions.insert(name.to_string(), Box::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Record a call to a registered function.
    pub fn serialize(&self, name: &str, args: Vec<CallArg>) -> Result<DeferredCall, DeferredError> {
        if !self.contains(name) {
            return Err(DeferredError::UnknownFunction(name.to_string()));
        }
        Ok(DeferredCall::new(name, args))
    }

    /// Check that `call` and every nested call name a registered function,
    /// and return a handle that can be invoked later.
    pub fn resolve(&self, call: &DeferredCall) -> Result<PreparedCall<'_, C>, DeferredError> {
        for name in call.function_names() {
            if !self.contains(name) {
                return Err(DeferredError::UnknownFunction(name.to_string()));
            }
        }
        Ok(PreparedCall {
            registry: self,
            call: call.clone(),
        })
    }

    /// Decode a stored JSON value and resolve it in one step.
    pub fn resolve_value(&self, value: &serde_json::Value) -> Result<PreparedCall<'_, C>, DeferredError> {
        self.resolve(&DeferredCall::decode(value)?)
    }

    fn invoke(&self, ctx: &mut C, call: &DeferredCall, implicit: &[CallArg]) -> Result<CallArg, DeferredError> {
        let f = self
            .functions
            .get(&call.function)
            .ok_or_else(|| DeferredError::UnknownFunction(call.function.clone()))?;

        let mut values = implicit.to_vec();
        for arg in &call.args {
            values.push(self.resolve_arg(ctx, arg, implicit)?);
        }
        f(ctx, &CallArgs::new(call.function.clone(), values))
    }

    fn resolve_arg(&self, ctx: &mut C, arg: &CallArg, implicit: &[CallArg]) -> Result<CallArg, DeferredError> {
        match arg {
            CallArg::Call(inner) => self.invoke(ctx, inner, implicit),
            CallArg::List(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    resolved.push(self.resolve_arg(ctx, item, implicit)?);
                }
                Ok(CallArg::List(resolved))
            }
            other => Ok(other.clone()),
        }
    }
}

/// A call whose function names have been checked against a registry.
pub struct PreparedCall<'r, C> {
    registry: &'r CallRegistry<C>,
    call: DeferredCall,
}

impl<C> PreparedCall<'_, C> {
    pub fn call(&self) -> &DeferredCall {
        &self.call
    }

    /// Run the call. `implicit` arguments are prepended to the argument list
    /// of this call and of every nested call.
    pub fn invoke(&self, ctx: &mut C, implicit: &[CallArg]) -> Result<CallArg, DeferredError> {
        self.registry.invoke(ctx, &self.call, implicit)
    }
}
