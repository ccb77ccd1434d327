//! Public interface for embedding and running wisp code.

use crate::{
    builtins,
    error::{CodeLoc, Exception},
    expressions::Ast,
    heap::Heap,
    interp::Interp,
    io::PrintWriter,
    lex::tokenize,
    natives::Natives,
    object::Object,
    parse::parse,
    scopes::Vars,
    value::Value,
};

/// A loaded script plus its live interpreter state.
///
/// The typical embedding (a game loop) looks like:
///
/// ```
/// use wisp::{NoPrint, Object, Runner, Value};
///
/// let code = "
///     g_total = 0;
///     tick = fn(dt) { g_total = g_total + dt; return g_total; };
/// ";
/// let mut runner = Runner::new(code, "game.wisp").unwrap();
/// runner.register_native("elapsed", |_, _| Ok(Value::Number(16.0)));
/// runner.run(&mut NoPrint).unwrap();
///
/// let total = runner.call("tick", vec![Object::Number(0.5)], &mut NoPrint).unwrap();
/// assert_eq!(total, Object::Number(0.5));
/// assert_eq!(runner.get("g_total"), Some(Object::Number(0.5)));
/// ```
///
/// State (globals, tables, arrays) persists across [`Runner::call`]s, which
/// is what lets the host drive `initGame`/`updateGame`-style entry points
/// frame after frame. On any [`Exception`] the runner keeps whatever state
/// it had at the point of failure; discard it for a clean slate.
#[derive(Debug)]
pub struct Runner {
    script_name: String,
    ast: Ast,
    heap: Heap,
    vars: Vars,
    natives: Natives,
}

impl Runner {
    /// Lexes and parses the script and registers the array builtins.
    /// Nothing is evaluated until [`Runner::run`].
    ///
    /// # Errors
    /// Returns the first lex or parse error, with its source location.
    pub fn new(code: &str, script_name: &str) -> Result<Self, Exception> {
        let tokens = tokenize(code)?;
        let ast = parse(&tokens)?;
        let mut natives = Natives::new();
        let mut vars = Vars::new();
        builtins::install(&mut natives, &mut vars);
        Ok(Self {
            script_name: script_name.to_owned(),
            ast,
            heap: Heap::new(),
            vars,
            natives,
        })
    }

    /// The script name given to [`Runner::new`], for error reporting.
    #[must_use]
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Registers a host function under a global name.
    ///
    /// The callable receives the evaluated arguments and the heap; a
    /// returned error message surfaces to the script as an eval error at
    /// the call site. Registrations may happen before or after
    /// [`Runner::run`]; a later registration under the same name shadows
    /// the earlier one.
    pub fn register_native(
        &mut self,
        name: &str,
        f: impl Fn(&mut Heap, &[Value]) -> Result<Value, String> + 'static,
    ) {
        let id = self.natives.register(name, f);
        self.vars.define_global(name, Value::NativeFn(id));
    }

    /// Evaluates the program root: top-level statements run in order and
    /// their effects (globals, function values, prints) persist on the
    /// runner.
    ///
    /// # Errors
    /// Returns the first eval error; the runner's state is left as of that
    /// moment.
    pub fn run(&mut self, print: &mut impl PrintWriter) -> Result<(), Exception> {
        let mut interp = Interp::new(&self.ast, &mut self.heap, &mut self.vars, &self.natives, print);
        interp.eval_root()
    }

    /// Calls a script (or native) function by its global name.
    ///
    /// Arguments are converted into runtime values, the call runs in a
    /// fresh activation, and the result converts back into an [`Object`].
    ///
    /// # Errors
    /// Fails if the name is unbound, the value is not callable, an argument
    /// cannot be converted, or the call itself raises an eval error.
    pub fn call(
        &mut self,
        name: &str,
        args: Vec<Object>,
        print: &mut impl PrintWriter,
    ) -> Result<Object, Exception> {
        let location = CodeLoc::default();
        let callee = self
            .vars
            .get_global(name)
            .cloned()
            .ok_or_else(|| Exception::eval(location, format!("`{name}` is not defined")))?;
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            let value = arg
                .into_value(&mut self.heap)
                .map_err(|message| Exception::eval(location, message))?;
            arg_values.push(value);
        }
        let mut interp = Interp::new(&self.ast, &mut self.heap, &mut self.vars, &self.natives, print);
        let result = interp.call_value(callee, &arg_values, location)?;
        Ok(Object::from_value(&result, &self.heap))
    }

    /// Reads a global by bare name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Object> {
        self.vars
            .get_global(name)
            .map(|value| Object::from_value(value, &self.heap))
    }

    /// Writes a global by bare name, creating it if absent.
    ///
    /// # Errors
    /// Fails for objects with no runtime counterpart (`Object::Repr`).
    pub fn set(&mut self, name: &str, object: Object) -> Result<(), Exception> {
        let value = object
            .into_value(&mut self.heap)
            .map_err(|message| Exception::eval(CodeLoc::default(), message))?;
        self.vars.define_global(name, value);
        Ok(())
    }
}
