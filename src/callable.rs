//! The callable object model: native functions, user functions (closures),
//! classes, and the instances classes construct.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear in callee position.
pub trait Callable<'a> {
    /// Exact number of arguments the callee accepts.
    fn arity(&self) -> usize;

    /// Invokes the callee.  The caller has already checked the arity.
    fn call(self: Rc<Self>, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>)
        -> Result<Value<'a>>;
}

// ───────────────────────────── native functions ────────────────────────────

/// A host‑implemented function such as `clock`.
pub struct NativeFunction<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value<'a>]) -> Value<'a>,
}

impl<'a> fmt::Debug for NativeFunction<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl<'a> Callable<'a> for NativeFunction<'a> {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        self: Rc<Self>,
        _interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}

// ───────────────────────────── user functions ──────────────────────────────

/// A function value: its declaration plus the environment that was current
/// when the declaration executed.
pub struct LoxFunction<'a> {
    declaration: Rc<FunctionDecl<'a>>,
    closure: EnvRef<'a>,
    is_initializer: bool,
}

impl<'a> LoxFunction<'a> {
    pub fn new(declaration: Rc<FunctionDecl<'a>>, closure: EnvRef<'a>, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.name.lexeme
    }

    /// Produces a copy of this method whose closure has one extra scope
    /// binding `this` to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance<'a>>>) -> LoxFunction<'a> {
        trace!("Binding method '{}'", self.name());

        let environment: EnvRef<'a> = Environment::child_of(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        LoxFunction::new(Rc::clone(&self.declaration), environment, self.is_initializer)
    }
}

impl<'a> fmt::Debug for LoxFunction<'a> {
    // The closure may contain this very function; never print it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl<'a> Callable<'a> for LoxFunction<'a> {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        self: Rc<Self>,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Calling user-defined function '{}'", self.name());

        let environment: EnvRef<'a> = Environment::child_of(&self.closure);

        {
            let mut scope = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                scope.define(param.lexeme, argument);
            }
        }

        let flow: Flow<'a> = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return Ok(Environment::get_at(&self.closure, 0, "this"));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

// ───────────────────────────────── classes ─────────────────────────────────

#[derive(Debug)]
pub struct LoxClass<'a> {
    name: String,
    methods: HashMap<String, Rc<LoxFunction<'a>>>,
}

impl<'a> LoxClass<'a> {
    pub fn new(name: &str, methods: HashMap<String, Rc<LoxFunction<'a>>>) -> Self {
        Self {
            name: name.to_string(),
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction<'a>>> {
        self.methods.get(name).cloned()
    }
}

impl<'a> Callable<'a> for LoxClass<'a> {
    fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// Constructs an instance and runs `init` on it, if the class has one.
    /// Whatever `init` returns is discarded in favour of the instance.
    fn call(
        self: Rc<Self>,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Instantiating class '{}'", self.name);

        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(&self))));

        if let Some(initializer) = self.find_method("init") {
            Rc::new(initializer.bind(Rc::clone(&instance))).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

// ──────────────────────────────── instances ────────────────────────────────

pub struct LoxInstance<'a> {
    class: Rc<LoxClass<'a>>,
    fields: HashMap<String, Value<'a>>,
}

impl<'a> LoxInstance<'a> {
    pub fn new(class: Rc<LoxClass<'a>>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Own fields shadow methods; methods come back bound to `instance`.
    pub fn get(instance: &Rc<RefCell<Self>>, name: &Token<'_>) -> Result<Value<'a>> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = this.class.find_method(name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance)))));
        }

        Err(LoxError::runtime(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &Token<'_>, value: Value<'a>) {
        self.fields.insert(name.lexeme.to_string(), value);
    }
}

impl<'a> fmt::Debug for LoxInstance<'a> {
    // Fields may point back at the instance; list names only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxInstance")
            .field("class", &self.class.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
