//! Sandboxed script execution for scene objects.
//!
//! Each object's script runs with a single bound variable, `self`, holding a
//! copy of the object's simulation fields (see [`marshal`]). After the script
//! finishes, every key of `self` is copied back onto the object.
//!
//! ```rhai
//! self.position = [100.0, 100.0];
//! self.speed = 3;             // new fields are kept as extra state
//! || { self.size[0] *= 2.0 }  // a trailing closure runs once after sync
//! ```
//!
//! With the per-tick hook enabled, a script may also define
//! `fn on_tick(dt) { this.position[0] += dt * 60.0; }`, where `this` is the
//! object's projection for that tick.

pub mod marshal;

pub use marshal::MarshalError;

use crate::config::ScriptLimits;
use crate::object::SceneObject;
use rhai::{CallFnOptions, Dynamic, Engine, EvalAltResult, FnPtr, Map, ParseError, Position, Scope, AST, FLOAT};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Name of the variable holding the object projection.
pub const SELF_BINDING: &str = "self";
/// Name of the optional per-tick hook.
pub const TICK_HOOK: &str = "on_tick";

/// When in an object's script lifecycle an error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPhase {
    Compile,
    /// Top-level body run on entering play.
    Run,
    /// The callable returned by the body.
    EntryPoint,
    Tick,
}

impl fmt::Display for ScriptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScriptPhase::Compile => "compile",
            ScriptPhase::Run => "run",
            ScriptPhase::EntryPoint => "entry point",
            ScriptPhase::Tick => "tick",
        })
    }
}

/// 1-based position in the script source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLocation {
    pub line: u32,
    pub column: u32,
}

impl ScriptLocation {
    fn from_position(pos: Position) -> Option<Self> {
        let line = pos.line()? as u32;
        Some(Self {
            line,
            column: pos.position().unwrap_or(1).max(1) as u32,
        })
    }
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Script failures. All of them abort the current play session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("Syntax error: {message}")]
    Compile {
        message: String,
        location: Option<ScriptLocation>,
    },
    #[error("Runtime error during {phase}: {message}")]
    Runtime {
        phase: ScriptPhase,
        message: String,
        location: Option<ScriptLocation>,
    },
    #[error("Invalid `self` after script: {0}")]
    Marshal(#[from] MarshalError),
}

impl ScriptError {
    fn compile(err: &ParseError) -> Self {
        ScriptError::Compile {
            message: err.to_string(),
            location: ScriptLocation::from_position(err.position()),
        }
    }

    fn runtime(phase: ScriptPhase, err: &EvalAltResult) -> Self {
        ScriptError::Runtime {
            phase,
            message: err.to_string(),
            location: ScriptLocation::from_position(err.position()),
        }
    }

    pub fn location(&self) -> Option<ScriptLocation> {
        match self {
            ScriptError::Compile { location, .. } | ScriptError::Runtime { location, .. } => *location,
            ScriptError::Marshal(_) => None,
        }
    }
}

/// The environment a single script run sees: a fresh scope with `self`.
pub struct ScriptEnv {
    scope: Scope<'static>,
}

impl ScriptEnv {
    /// Current value of `self`, or an error if the script replaced it.
    pub fn self_map(&self) -> Result<Map, MarshalError> {
        match self.scope.get_value::<Dynamic>(SELF_BINDING) {
            Some(value) => {
                let type_name = value.type_name().to_string();
                value.try_cast::<Map>().ok_or(MarshalError::NotAMap(type_name))
            }
            None => Err(MarshalError::NotAMap("()".to_string())),
        }
    }
}

/// Outcome of a successful [`ScriptBridge::execute`].
#[derive(Debug, Clone)]
pub struct ScriptRun {
    /// Compiled script, kept when it defines the per-tick hook.
    pub tick_hook: Option<AST>,
    pub entry_point_called: bool,
    /// Fields added to `self` that could not be kept (functions, closures).
    pub dropped_fields: Vec<String>,
}

/// Runs object scripts against a sandboxed rhai engine.
///
/// The engine holds no script state; every run gets its own scope, so
/// objects never observe each other and nothing survives between sessions.
pub struct ScriptBridge {
    engine: Engine,
    output: Rc<RefCell<Vec<String>>>,
}

impl ScriptBridge {
    /// Create a bridge with the given sandbox limits.
    pub fn new(limits: &ScriptLimits) -> Self {
        let mut engine = Engine::new();

        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);
        engine.disable_symbol("eval");

        let output = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&output);
        engine.on_print(move |text| sink.borrow_mut().push(text.to_string()));
        engine.on_debug(|text, source, pos| {
            log::debug!("[script {:?} @ {}] {}", source, pos, text);
        });

        Self { engine, output }
    }

    /// Compile a script body.
    pub fn compile(&self, source: &str) -> Result<AST, ScriptError> {
        self.engine.compile(source).map_err(|e| ScriptError::compile(&e))
    }

    /// Build the environment for one run of `object`'s script.
    pub fn prepare(&self, object: &SceneObject) -> ScriptEnv {
        let mut scope = Scope::new();
        scope.push(SELF_BINDING, marshal::project(object));
        ScriptEnv { scope }
    }

    /// Run the object's script and copy `self` back onto it.
    ///
    /// If the body evaluates to a function pointer or closure it is called
    /// once after the copy-back, and `self` is synced again afterwards.
    pub fn execute(&self, object: &mut SceneObject) -> Result<ScriptRun, ScriptError> {
        let ast = self.compile(&object.script)?;
        let mut env = self.prepare(object);

        let result: Dynamic = self
            .engine
            .eval_ast_with_scope(&mut env.scope, &ast)
            .map_err(|e| ScriptError::runtime(ScriptPhase::Run, &e))?;
        let mut dropped_fields = marshal::apply(object, &env.self_map()?)?;

        let mut entry_point_called = false;
        if let Some(entry) = result.try_cast::<FnPtr>() {
            log::debug!("Calling entry point {} for {}", entry.fn_name(), object.id());
            let _: Dynamic = entry
                .call(&self.engine, &ast, ())
                .map_err(|e| ScriptError::runtime(ScriptPhase::EntryPoint, &e))?;
            for field in marshal::apply(object, &env.self_map()?)? {
                if !dropped_fields.contains(&field) {
                    dropped_fields.push(field);
                }
            }
            entry_point_called = true;
        }

        let tick_hook = has_tick_hook(&ast).then_some(ast);
        Ok(ScriptRun {
            tick_hook,
            entry_point_called,
            dropped_fields,
        })
    }

    /// Call `on_tick(dt)` with `this` bound to the object's projection.
    pub fn call_tick(&self, object: &mut SceneObject, ast: &AST, dt: f64) -> Result<(), ScriptError> {
        let mut this = Dynamic::from_map(marshal::project(object));
        let mut scope = Scope::new();
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true).bind_this_ptr(&mut this);
        let _: Dynamic = self
            .engine
            .call_fn_with_options(options, &mut scope, ast, TICK_HOOK, (dt as FLOAT,))
            .map_err(|e| ScriptError::runtime(ScriptPhase::Tick, &e))?;

        let type_name = this.type_name().to_string();
        let map = this.try_cast::<Map>().ok_or(MarshalError::NotAMap(type_name))?;
        marshal::apply(object, &map)?;
        Ok(())
    }

    /// Drain text the scripts printed since the last call.
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.borrow_mut())
    }
}

fn has_tick_hook(ast: &AST) -> bool {
    ast.iter_functions().any(|f| f.name == TICK_HOOK && f.params.len() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Rgb, ShapeKind};
    use kurbo::{Point, Size};
    use serde_json::Value;

    fn bridge() -> ScriptBridge {
        ScriptBridge::new(&ScriptLimits::default())
    }

    fn square(script: &str) -> SceneObject {
        SceneObject::new_shape(ShapeKind::Square, Point::new(10.0, 10.0), Size::new(50.0, 50.0), Rgb::blue())
            .with_script(script)
    }

    #[test]
    fn test_position_write() {
        let mut obj = square("self.position = [100.0, 100.0];");
        let run = bridge().execute(&mut obj).unwrap();
        assert_eq!(obj.shape.position, Point::new(100.0, 100.0));
        assert!(!run.entry_point_called);
        assert!(run.tick_hook.is_none());
    }

    #[test]
    fn test_reads_own_fields() {
        let mut obj = square("self.text = `${self.kind}:${self.size[0]}`;");
        bridge().execute(&mut obj).unwrap();
        assert_eq!(obj.shape.text, "square:50.0");
    }

    #[test]
    fn test_empty_script() {
        let mut obj = square("");
        let before = obj.clone();
        bridge().execute(&mut obj).unwrap();
        assert_eq!(obj, before);
    }

    #[test]
    fn test_dynamic_fields_survive() {
        let mut obj = square("self.speed = 3; self.label = \"hero\";");
        bridge().execute(&mut obj).unwrap();
        assert_eq!(obj.extras.get("speed"), Some(&Value::from(3)));
        assert_eq!(obj.extras.get("label"), Some(&Value::from("hero")));
    }

    #[test]
    fn test_entry_point_closure() {
        let mut obj = square("self.position = [0.0, 0.0];\n|| { self.position[0] += 7.0; }");
        let run = bridge().execute(&mut obj).unwrap();
        assert!(run.entry_point_called);
        assert_eq!(obj.shape.position, Point::new(7.0, 0.0));
    }

    #[test]
    fn test_entry_point_named_function() {
        let bridge = bridge();
        let mut obj = square("fn go() { print(\"go\"); }\nFn(\"go\")");
        let run = bridge.execute(&mut obj).unwrap();
        assert!(run.entry_point_called);
        assert_eq!(bridge.take_output(), vec!["go".to_string()]);
    }

    #[test]
    fn test_function_fields_dropped() {
        let mut obj = square("self.update = || { 1 };\nself.n = 1;");
        let run = bridge().execute(&mut obj).unwrap();
        assert_eq!(run.dropped_fields, vec!["update".to_string()]);
        assert_eq!(obj.extras.get("n"), Some(&Value::from(1)));
    }

    #[test]
    fn test_syntax_error() {
        let mut obj = square("self.position = ;");
        let before = obj.clone();
        let err = bridge().execute(&mut obj).unwrap_err();
        assert!(matches!(err, ScriptError::Compile { .. }));
        assert_eq!(err.location().map(|l| l.line), Some(1));
        assert_eq!(obj, before);
    }

    #[test]
    fn test_runtime_error() {
        let mut obj = square("self.position = [1.0, 1.0];\nthrow \"boom\";");
        let before = obj.clone();
        let err = bridge().execute(&mut obj).unwrap_err();
        assert!(matches!(err, ScriptError::Runtime { phase: ScriptPhase::Run, .. }));
        assert_eq!(obj, before);
    }

    #[test]
    fn test_replacing_self_is_an_error() {
        let mut obj = square("self = 5;");
        let err = bridge().execute(&mut obj).unwrap_err();
        assert!(matches!(err, ScriptError::Marshal(MarshalError::NotAMap(_))));
    }

    #[test]
    fn test_operation_limit() {
        let limits = ScriptLimits {
            max_operations: 1_000,
            ..ScriptLimits::default()
        };
        let mut obj = square("loop { }");
        let err = ScriptBridge::new(&limits).execute(&mut obj).unwrap_err();
        assert!(matches!(err, ScriptError::Runtime { .. }));
    }

    #[test]
    fn test_eval_disabled() {
        let mut obj = square("eval(\"self.text = 1\");");
        assert!(bridge().execute(&mut obj).is_err());
    }

    #[test]
    fn test_print_captured() {
        let bridge = bridge();
        let mut obj = square("print(\"hello from \" + self.kind);");
        bridge.execute(&mut obj).unwrap();
        assert_eq!(bridge.take_output(), vec!["hello from square".to_string()]);
        assert!(bridge.take_output().is_empty());
    }

    #[test]
    fn test_no_state_leaks_between_objects() {
        let bridge = bridge();
        let mut a = square("let secret = 42; self.a = secret;");
        let mut b = square("self.saw = is_def_var(\"secret\");");
        bridge.execute(&mut a).unwrap();
        bridge.execute(&mut b).unwrap();
        assert_eq!(b.extras.get("saw"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_tick_hook() {
        let bridge = bridge();
        let mut obj = square("fn on_tick(dt) { this.position[0] += dt * 10.0; }");
        let run = bridge.execute(&mut obj).unwrap();
        let ast = run.tick_hook.expect("hook should be detected");

        bridge.call_tick(&mut obj, &ast, 0.5).unwrap();
        bridge.call_tick(&mut obj, &ast, 0.5).unwrap();
        assert_eq!(obj.shape.position, Point::new(20.0, 10.0));
    }
}
