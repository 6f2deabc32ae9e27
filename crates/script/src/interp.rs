//! Script Evaluator
//!
//! Async tree-walking interpreter over the parsed AST. The global
//! environment is closed and statically enumerated: the `mem` capability,
//! the `console`/`json`/`re` namespaces, and a fixed set of pure helper
//! functions. No other identifier resolves to anything, which is the
//! authoritative security boundary of the sandbox.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use lorekeeper_store::KnowledgeStore;

use crate::error::{ScriptError, ScriptResult};
use crate::parser::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::value::Value;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Reserved namespace identifiers; they never resolve as plain values and
/// cannot be shadowed by `let`.
const NAMESPACES: &[&str] = &["mem", "console", "json", "re"];

/// Statement/expression evaluation outcome, threading `return` upward.
enum Flow {
    Normal(Value),
    Return(Value),
}

/// One script execution over one capability instance.
pub struct Interp {
    store: Arc<KnowledgeStore>,
    scopes: Vec<HashMap<String, Value>>,
    steps_left: u64,
}

impl Interp {
    pub fn new(store: Arc<KnowledgeStore>, max_steps: u64) -> Self {
        Self {
            store,
            scopes: vec![HashMap::new()],
            steps_left: max_steps,
        }
    }

    /// Run a program; the result is the explicit `return` value or the
    /// value of the last statement.
    pub async fn run(&mut self, program: &[Stmt]) -> ScriptResult<Value> {
        let mut last = Value::Null;
        for stmt in program {
            match self.eval_stmt(stmt).await? {
                Flow::Normal(value) => last = value,
                Flow::Return(value) => return Ok(value),
            }
        }
        Ok(last)
    }

    fn charge_step(&mut self) -> ScriptResult<()> {
        if self.steps_left == 0 {
            return Err(ScriptError::timeout(
                "script exceeded its step budget (possible runaway loop)",
            ));
        }
        self.steps_left -= 1;
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }

    // -- Statements ------------------------------------------------------

    fn eval_stmt<'a>(&'a mut self, stmt: &'a Stmt) -> BoxFuture<'a, ScriptResult<Flow>> {
        Box::pin(async move {
            self.charge_step()?;
            match stmt {
                Stmt::Let { name, value } => {
                    if NAMESPACES.contains(&name.as_str()) {
                        return Err(ScriptError::runtime(format!(
                            "'{name}' is a reserved name and cannot be redefined"
                        )));
                    }
                    let value = self.eval_expr(value).await?;
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert(name.clone(), value);
                    }
                    Ok(Flow::Normal(Value::Null))
                }
                Stmt::Assign { target, value } => {
                    let value = self.eval_expr(value).await?;
                    self.assign(target, value).await?;
                    Ok(Flow::Normal(Value::Null))
                }
                Stmt::If {
                    cond,
                    then_block,
                    else_block,
                } => {
                    if self.eval_expr(cond).await?.truthy() {
                        self.eval_block(then_block).await
                    } else if let Some(else_block) = else_block {
                        self.eval_block(else_block).await
                    } else {
                        Ok(Flow::Normal(Value::Null))
                    }
                }
                Stmt::While { cond, body } => {
                    while self.eval_expr(cond).await?.truthy() {
                        self.charge_step()?;
                        if let Flow::Return(value) = self.eval_block(body).await? {
                            return Ok(Flow::Return(value));
                        }
                    }
                    Ok(Flow::Normal(Value::Null))
                }
                Stmt::For { var, iter, body } => {
                    let iterable = self.eval_expr(iter).await?;
                    let items: Vec<Value> = match iterable {
                        Value::List(items) => items,
                        Value::Map(entries) => {
                            entries.into_keys().map(Value::Str).collect()
                        }
                        other => {
                            return Err(ScriptError::runtime(format!(
                                "cannot iterate over {}",
                                other.type_name()
                            )))
                        }
                    };
                    for item in items {
                        self.charge_step()?;
                        self.scopes.push(HashMap::from([(var.clone(), item)]));
                        let flow = self.eval_block_in_place(body).await;
                        self.scopes.pop();
                        if let Flow::Return(value) = flow? {
                            return Ok(Flow::Return(value));
                        }
                    }
                    Ok(Flow::Normal(Value::Null))
                }
                Stmt::Return(value) => {
                    let value = match value {
                        Some(expr) => self.eval_expr(expr).await?,
                        None => Value::Null,
                    };
                    Ok(Flow::Return(value))
                }
                Stmt::Expr(expr) => Ok(Flow::Normal(self.eval_expr(expr).await?)),
            }
        })
    }

    async fn eval_block(&mut self, block: &[Stmt]) -> ScriptResult<Flow> {
        self.scopes.push(HashMap::new());
        let flow = self.eval_block_in_place(block).await;
        self.scopes.pop();
        flow
    }

    /// Evaluate a block without pushing a scope (the caller did).
    async fn eval_block_in_place(&mut self, block: &[Stmt]) -> ScriptResult<Flow> {
        let mut last = Value::Null;
        for stmt in block {
            match self.eval_stmt(stmt).await? {
                Flow::Normal(value) => last = value,
                Flow::Return(value) => return Ok(Flow::Return(value)),
            }
        }
        Ok(Flow::Normal(last))
    }

    /// Assign through an identifier, member, or index chain.
    async fn assign(&mut self, target: &Expr, value: Value) -> ScriptResult<()> {
        enum Accessor {
            Key(String),
            Index(usize),
        }

        let mut accessors = Vec::new();
        let mut current = target;
        let base = loop {
            match current {
                Expr::Ident(name) => break name.as_str(),
                Expr::Member { target, name } => {
                    accessors.push(Accessor::Key(name.clone()));
                    current = target.as_ref();
                }
                Expr::Index { target, index } => {
                    match self.eval_expr(index).await? {
                        Value::Str(key) => accessors.push(Accessor::Key(key)),
                        Value::Num(n) if n >= 0.0 => {
                            accessors.push(Accessor::Index(n as usize))
                        }
                        other => {
                            return Err(ScriptError::runtime(format!(
                                "invalid index of type {}",
                                other.type_name()
                            )))
                        }
                    }
                    current = target.as_ref();
                }
                _ => return Err(ScriptError::runtime("invalid assignment target")),
            }
        };
        accessors.reverse();

        if NAMESPACES.contains(&base) {
            return Err(ScriptError::runtime(format!(
                "'{base}' is a reserved name and cannot be assigned"
            )));
        }

        let base_name = base.to_string();
        let Some(mut node) = self.lookup_mut(&base_name) else {
            return Err(ScriptError::runtime(format!(
                "'{base_name}' is not defined"
            )));
        };

        for accessor in accessors {
            node = match (node, accessor) {
                (Value::Map(entries), Accessor::Key(key)) => {
                    entries.entry(key).or_insert(Value::Null)
                }
                (Value::List(items), Accessor::Index(index)) => {
                    let len = items.len();
                    items.get_mut(index).ok_or_else(|| {
                        ScriptError::runtime(format!(
                            "list index {index} out of range (len {len})"
                        ))
                    })?
                }
                (other, _) => {
                    return Err(ScriptError::runtime(format!(
                        "cannot assign into {}",
                        other.type_name()
                    )))
                }
            };
        }
        *node = value;
        Ok(())
    }

    // -- Expressions -----------------------------------------------------

    fn eval_expr<'a>(&'a mut self, expr: &'a Expr) -> BoxFuture<'a, ScriptResult<Value>> {
        Box::pin(async move {
            self.charge_step()?;
            match expr {
                Expr::Null => Ok(Value::Null),
                Expr::Bool(b) => Ok(Value::Bool(*b)),
                Expr::Num(n) => Ok(Value::Num(*n)),
                Expr::Str(s) => Ok(Value::Str(s.clone())),
                Expr::Ident(name) => {
                    if NAMESPACES.contains(&name.as_str()) {
                        return Err(ScriptError::runtime(format!(
                            "'{name}' is a namespace; call one of its methods instead"
                        )));
                    }
                    self.lookup(name).cloned().ok_or_else(|| {
                        ScriptError::runtime(format!("'{name}' is not defined"))
                    })
                }
                Expr::List(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(self.eval_expr(item).await?);
                    }
                    Ok(Value::List(out))
                }
                Expr::Map(entries) => {
                    let mut out = BTreeMap::new();
                    for (key, value) in entries {
                        out.insert(key.clone(), self.eval_expr(value).await?);
                    }
                    Ok(Value::Map(out))
                }
                Expr::Index { target, index } => {
                    let target = self.eval_expr(target).await?;
                    let index = self.eval_expr(index).await?;
                    Ok(index_value(&target, &index))
                }
                Expr::Member { target, name } => {
                    if let Expr::Ident(ns) = target.as_ref() {
                        if NAMESPACES.contains(&ns.as_str()) {
                            return Err(ScriptError::runtime(format!(
                                "{ns}.{name} must be called, not read"
                            )));
                        }
                    }
                    let target = self.eval_expr(target).await?;
                    match target {
                        Value::Map(entries) => {
                            Ok(entries.get(name).cloned().unwrap_or(Value::Null))
                        }
                        other => Err(ScriptError::runtime(format!(
                            "cannot read member '{name}' of {}",
                            other.type_name()
                        ))),
                    }
                }
                Expr::Call { callee, args } => {
                    let mut values = Vec::with_capacity(args.len());
                    for arg in args {
                        values.push(self.eval_expr(arg).await?);
                    }
                    match callee.as_ref() {
                        Expr::Member { target, name } => match target.as_ref() {
                            Expr::Ident(ns) if ns == "mem" => {
                                self.dispatch_mem(name, values).await
                            }
                            Expr::Ident(ns) if ns == "console" => {
                                dispatch_console(name, &values)
                            }
                            Expr::Ident(ns) if ns == "json" => dispatch_json(name, &values),
                            Expr::Ident(ns) if ns == "re" => dispatch_regex(name, &values),
                            _ => Err(ScriptError::runtime(format!(
                                "unknown method '{name}'"
                            ))),
                        },
                        Expr::Ident(name) => dispatch_builtin(name, values),
                        _ => Err(ScriptError::runtime("value is not callable")),
                    }
                }
                Expr::Unary { op, expr } => {
                    let value = self.eval_expr(expr).await?;
                    match op {
                        UnaryOp::Neg => Ok(Value::Num(-value.as_num("operand of '-'")?)),
                        UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                    }
                }
                Expr::Binary { op, left, right } => {
                    let left = self.eval_expr(left).await?;
                    let right = self.eval_expr(right).await?;
                    binary_op(*op, left, right)
                }
                Expr::And { left, right } => {
                    let left = self.eval_expr(left).await?;
                    if !left.truthy() {
                        return Ok(left);
                    }
                    self.eval_expr(right).await
                }
                Expr::Or { left, right } => {
                    let left = self.eval_expr(left).await?;
                    if left.truthy() {
                        return Ok(left);
                    }
                    self.eval_expr(right).await
                }
            }
        })
    }

    // -- Capability dispatch ---------------------------------------------

    /// Every `mem.*` call suspends here; the wire names are the camelCase
    /// capability surface the model is taught.
    async fn dispatch_mem(&mut self, name: &str, args: Vec<Value>) -> ScriptResult<Value> {
        let store = Arc::clone(&self.store);
        match name {
            "readFile" => {
                let path = required(&args, 0, "mem.readFile(path)")?.as_str("path")?;
                Ok(Value::Str(store.read_file(path).await?))
            }
            "writeFile" => {
                let path = required(&args, 0, "mem.writeFile(path, content)")?.as_str("path")?;
                let content =
                    required(&args, 1, "mem.writeFile(path, content)")?.as_str("content")?;
                store.write_file(path, content).await?;
                Ok(Value::Null)
            }
            "updateFile" => {
                let usage = "mem.updateFile(path, expected, newContent)";
                let path = required(&args, 0, usage)?.as_str("path")?;
                let expected = required(&args, 1, usage)?.as_str("expected")?;
                let new_content = required(&args, 2, usage)?.as_str("newContent")?;
                store.update_file(path, expected, new_content).await?;
                Ok(Value::Null)
            }
            "deleteFile" => {
                let path = required(&args, 0, "mem.deleteFile(path)")?.as_str("path")?;
                store.delete_file(path).await?;
                Ok(Value::Null)
            }
            "renameFile" => {
                let usage = "mem.renameFile(from, to)";
                let from = required(&args, 0, usage)?.as_str("from")?;
                let to = required(&args, 1, usage)?.as_str("to")?;
                store.rename_file(from, to).await?;
                Ok(Value::Null)
            }
            "exists" => {
                let path = required(&args, 0, "mem.exists(path)")?.as_str("path")?;
                Ok(Value::Bool(store.exists(path).await))
            }
            "createDirectory" => {
                let path =
                    required(&args, 0, "mem.createDirectory(path)")?.as_str("path")?;
                store.create_directory(path).await?;
                Ok(Value::Null)
            }
            "listEntries" => {
                let path = required(&args, 0, "mem.listEntries(path)")?.as_str("path")?;
                let entries = store.list_entries(path).await?;
                Ok(Value::List(
                    entries
                        .into_iter()
                        .map(|entry| {
                            Value::Map(BTreeMap::from([
                                ("name".to_string(), Value::Str(entry.name)),
                                ("isDir".to_string(), Value::Bool(entry.is_dir)),
                            ]))
                        })
                        .collect(),
                ))
            }
            "commit" => {
                let message = required(&args, 0, "mem.commit(message)")?.as_str("message")?;
                Ok(Value::Str(store.commit(message).await?))
            }
            "diff" => {
                let path = required(&args, 0, "mem.diff(path, from?, to?)")?.as_str("path")?;
                let from = optional_str(&args, 1, "from")?;
                let to = optional_str(&args, 2, "to")?;
                Ok(Value::Str(
                    store.diff(path, from.as_deref(), to.as_deref()).await?,
                ))
            }
            "log" => {
                let path = optional_str(&args, 0, "path")?;
                let max = match args.get(1) {
                    Some(value) => value.as_num("maxEntries")? as usize,
                    None => 20,
                };
                let entries = store.log(path.as_deref(), max).await?;
                Ok(json_value(&entries)?)
            }
            "stagedOrChangedFiles" => {
                let status = store.staged_or_changed_files().await?;
                Ok(json_value(&status)?)
            }
            "saveCheckpoint" => {
                store.save_checkpoint().await?;
                Ok(Value::Null)
            }
            "revertToLastCheckpoint" => {
                Ok(Value::Bool(store.revert_to_last_checkpoint().await?))
            }
            "discardChanges" => Ok(Value::Bool(store.discard_changes().await)),
            "queryGraph" => {
                let query = required(&args, 0, "mem.queryGraph(query)")?.as_str("query")?;
                let matches = store.query_graph(query).await?;
                Ok(json_value(&matches)?)
            }
            "getOutgoingLinks" => {
                let path =
                    required(&args, 0, "mem.getOutgoingLinks(path)")?.as_str("path")?;
                let links = store.outgoing_links(path).await?;
                Ok(Value::List(links.into_iter().map(Value::Str).collect()))
            }
            "getBacklinks" => {
                let path = required(&args, 0, "mem.getBacklinks(path)")?.as_str("path")?;
                let sources = store.backlinks(path).await?;
                Ok(Value::List(sources.into_iter().map(Value::Str).collect()))
            }
            "searchGlobal" => {
                let query = required(&args, 0, "mem.searchGlobal(query)")?.as_str("query")?;
                let hits = store.search_global(query).await?;
                Ok(Value::List(hits.into_iter().map(Value::Str).collect()))
            }
            "getWorkspaceRoot" => Ok(Value::Str(
                store.workspace_root().to_string_lossy().to_string(),
            )),
            "estimateTokens" => {
                let text = required(&args, 0, "mem.estimateTokens(text)")?.as_str("text")?;
                Ok(Value::Num(lorekeeper_store::estimate_tokens(text) as f64))
            }
            "fileTokens" => {
                let path = required(&args, 0, "mem.fileTokens(path)")?.as_str("path")?;
                Ok(Value::Num(store.file_tokens(path).await? as f64))
            }
            "directoryTokenStats" => {
                let path =
                    required(&args, 0, "mem.directoryTokenStats(path)")?.as_str("path")?;
                let stats = store.directory_token_stats(path).await?;
                Ok(json_value(&stats)?)
            }
            other => Err(ScriptError::runtime(format!(
                "mem.{other} is not part of the capability surface"
            ))),
        }
    }
}

// -- Pure helpers ---------------------------------------------------------

fn required<'v>(args: &'v [Value], index: usize, usage: &str) -> ScriptResult<&'v Value> {
    args.get(index).ok_or_else(|| {
        ScriptError::runtime(format!("missing argument {}: usage {usage}", index + 1))
    })
}

fn optional_str(args: &[Value], index: usize, what: &str) -> ScriptResult<Option<String>> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(value.as_str(what)?.to_string())),
    }
}

fn json_value<T: serde::Serialize>(value: &T) -> ScriptResult<Value> {
    let json = serde_json::to_value(value)
        .map_err(|e| ScriptError::runtime(format!("result serialization failed: {e}")))?;
    Ok(Value::from_json(&json))
}

fn index_value(target: &Value, index: &Value) -> Value {
    match (target, index) {
        (Value::List(items), Value::Num(n)) if *n >= 0.0 => {
            items.get(*n as usize).cloned().unwrap_or(Value::Null)
        }
        (Value::Map(entries), Value::Str(key)) => {
            entries.get(key).cloned().unwrap_or(Value::Null)
        }
        (Value::Str(s), Value::Num(n)) if *n >= 0.0 => s
            .chars()
            .nth(*n as usize)
            .map(|c| Value::Str(c.to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn binary_op(op: BinaryOp, left: Value, right: Value) -> ScriptResult<Value> {
    use BinaryOp::*;
    match op {
        Add => match (&left, &right) {
            (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::Str(format!("{left}{right}")))
            }
            _ => Err(ScriptError::runtime(format!(
                "cannot add {} and {}",
                left.type_name(),
                right.type_name()
            ))),
        },
        Sub | Mul | Div | Rem => {
            let a = left.as_num("left operand")?;
            let b = right.as_num("right operand")?;
            Ok(Value::Num(match op {
                Sub => a - b,
                Mul => a * b,
                Div => a / b,
                Rem => a % b,
                _ => unreachable!(),
            }))
        }
        Eq => Ok(Value::Bool(left == right)),
        NotEq => Ok(Value::Bool(left != right)),
        Lt | LtEq | Gt | GtEq => {
            let ordering = match (&left, &right) {
                (Value::Num(a), Value::Num(b)) => a.partial_cmp(b),
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => None,
            };
            let Some(ordering) = ordering else {
                return Err(ScriptError::runtime(format!(
                    "cannot compare {} and {}",
                    left.type_name(),
                    right.type_name()
                )));
            };
            Ok(Value::Bool(match op {
                Lt => ordering == std::cmp::Ordering::Less,
                LtEq => ordering != std::cmp::Ordering::Greater,
                Gt => ordering == std::cmp::Ordering::Greater,
                GtEq => ordering != std::cmp::Ordering::Less,
                _ => unreachable!(),
            }))
        }
    }
}

fn dispatch_console(name: &str, args: &[Value]) -> ScriptResult<Value> {
    let line = args
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    match name {
        "log" => tracing::info!(target: "sandbox", "{line}"),
        "warn" => tracing::warn!(target: "sandbox", "{line}"),
        "error" => tracing::error!(target: "sandbox", "{line}"),
        other => {
            return Err(ScriptError::runtime(format!(
                "console.{other} is not available"
            )))
        }
    }
    Ok(Value::Null)
}

fn dispatch_json(name: &str, args: &[Value]) -> ScriptResult<Value> {
    match name {
        "parse" => {
            let text = required(args, 0, "json.parse(text)")?.as_str("text")?;
            let parsed: serde_json::Value = serde_json::from_str(text)
                .map_err(|e| ScriptError::runtime(format!("invalid JSON: {e}")))?;
            Ok(Value::from_json(&parsed))
        }
        "stringify" => {
            let value = required(args, 0, "json.stringify(value)")?;
            Ok(Value::Str(value.to_json_string()))
        }
        other => Err(ScriptError::runtime(format!(
            "json.{other} is not available"
        ))),
    }
}

fn dispatch_regex(name: &str, args: &[Value]) -> ScriptResult<Value> {
    let usage = match name {
        "test" => "re.test(pattern, text)",
        "find" => "re.find(pattern, text)",
        "findAll" => "re.findAll(pattern, text)",
        other => {
            return Err(ScriptError::runtime(format!(
                "re.{other} is not available"
            )))
        }
    };
    let pattern = required(args, 0, usage)?.as_str("pattern")?;
    let text = required(args, 1, usage)?.as_str("text")?;
    let regex = regex::Regex::new(pattern)
        .map_err(|e| ScriptError::runtime(format!("invalid regex: {e}")))?;
    match name {
        "test" => Ok(Value::Bool(regex.is_match(text))),
        "find" => Ok(regex
            .find(text)
            .map(|m| Value::Str(m.as_str().to_string()))
            .unwrap_or(Value::Null)),
        "findAll" => Ok(Value::List(
            regex
                .find_iter(text)
                .map(|m| Value::Str(m.as_str().to_string()))
                .collect(),
        )),
        _ => unreachable!(),
    }
}

fn dispatch_builtin(name: &str, args: Vec<Value>) -> ScriptResult<Value> {
    match name {
        "len" => {
            let value = required(&args, 0, "len(value)")?;
            let len = match value {
                Value::Str(s) => s.chars().count(),
                Value::List(items) => items.len(),
                Value::Map(entries) => entries.len(),
                other => {
                    return Err(ScriptError::runtime(format!(
                        "len() expects a string, list, or map, got {}",
                        other.type_name()
                    )))
                }
            };
            Ok(Value::Num(len as f64))
        }
        "str" => Ok(Value::Str(
            required(&args, 0, "str(value)")?.to_string(),
        )),
        "num" => {
            let value = required(&args, 0, "num(value)")?;
            Ok(match value {
                Value::Num(n) => Value::Num(*n),
                Value::Bool(b) => Value::Num(if *b { 1.0 } else { 0.0 }),
                Value::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Num)
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            })
        }
        "trim" => Ok(Value::Str(
            required(&args, 0, "trim(text)")?.as_str("text")?.trim().to_string(),
        )),
        "lower" => Ok(Value::Str(
            required(&args, 0, "lower(text)")?
                .as_str("text")?
                .to_lowercase(),
        )),
        "upper" => Ok(Value::Str(
            required(&args, 0, "upper(text)")?
                .as_str("text")?
                .to_uppercase(),
        )),
        "split" => {
            let usage = "split(text, separator)";
            let text = required(&args, 0, usage)?.as_str("text")?;
            let sep = required(&args, 1, usage)?.as_str("separator")?;
            Ok(Value::List(
                text.split(sep)
                    .map(|part| Value::Str(part.to_string()))
                    .collect(),
            ))
        }
        "join" => {
            let usage = "join(list, separator)";
            let Value::List(items) = required(&args, 0, usage)? else {
                return Err(ScriptError::runtime("join() expects a list"));
            };
            let sep = required(&args, 1, usage)?.as_str("separator")?;
            Ok(Value::Str(
                items
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(sep),
            ))
        }
        "contains" => {
            let usage = "contains(container, needle)";
            let container = required(&args, 0, usage)?;
            let needle = required(&args, 1, usage)?;
            let found = match container {
                Value::Str(s) => s.contains(needle.as_str("needle")?),
                Value::List(items) => items.contains(needle),
                Value::Map(entries) => entries.contains_key(needle.as_str("needle")?),
                other => {
                    return Err(ScriptError::runtime(format!(
                        "contains() expects a string, list, or map, got {}",
                        other.type_name()
                    )))
                }
            };
            Ok(Value::Bool(found))
        }
        "keys" => {
            let Value::Map(entries) = required(&args, 0, "keys(map)")? else {
                return Err(ScriptError::runtime("keys() expects a map"));
            };
            Ok(Value::List(
                entries.keys().cloned().map(Value::Str).collect(),
            ))
        }
        "push" => {
            let usage = "push(list, item)";
            let Value::List(items) = required(&args, 0, usage)? else {
                return Err(ScriptError::runtime("push() expects a list"));
            };
            let item = required(&args, 1, usage)?;
            let mut out = items.clone();
            out.push(item.clone());
            Ok(Value::List(out))
        }
        "range" => {
            let usage = "range(end) or range(start, end)";
            let first = required(&args, 0, usage)?.as_num("start")?;
            let (start, end) = match args.get(1) {
                Some(value) => (first, value.as_num("end")?),
                None => (0.0, first),
            };
            let mut out = Vec::new();
            let mut current = start;
            while current < end {
                out.push(Value::Num(current));
                current += 1.0;
            }
            Ok(Value::List(out))
        }
        "now" => Ok(Value::Str(chrono::Utc::now().to_rfc3339())),
        other => Err(ScriptError::runtime(format!(
            "function '{other}' is not defined"
        ))),
    }
}
