use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::Instant;

use log::{debug, info, trace};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::callable::{LoxClass, LoxFunction, LoxInstance, NativeFunction};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Origin of the millisecond counter returned by `clock()`.
static CLOCK_ORIGIN: OnceLock<Instant> = OnceLock::new();

fn clock<'a>(_arguments: &[Value<'a>]) -> Value<'a> {
    let origin: &Instant = CLOCK_ORIGIN.get_or_init(Instant::now);

    Value::Number(origin.elapsed().as_secs_f64() * 1000.0)
}

/// How a statement finished.  `Return` unwinds statement by statement until
/// the enclosing function call consumes it.
#[derive(Debug)]
pub enum Flow<'a> {
    Normal,
    Return(Value<'a>),
}

pub struct Interpreter<'a> {
    /// Top‑level declarations.  Its parent is the root scope holding the
    /// natives.  Names the resolver could not bind locally are looked up
    /// from here.
    top_level: EnvRef<'a>,
    environment: EnvRef<'a>,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write + 'a>,
}

impl<'a> Default for Interpreter<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter whose `print` statements write to `out`, and
    /// defines native functions such as `clock`.
    pub fn with_output(out: Box<dyn Write + 'a>) -> Self {
        info!("Initializing Interpreter");

        CLOCK_ORIGIN.get_or_init(Instant::now);

        let globals: EnvRef<'a> = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            })),
        );

        let top_level: EnvRef<'a> = Environment::child_of(&globals);

        Self {
            environment: Rc::clone(&top_level),
            top_level,
            locals: HashMap::new(),
            out,
        }
    }

    /// Called by the resolver: the expression `id` refers to a binding
    /// `depth` scopes out from where it is evaluated.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        trace!("Expression {:?} resolved at depth {}", id, depth);
        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  Stops at the first
    /// runtime error.
    pub fn interpret(&mut self, statements: &[Stmt<'a>]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        self.environment = Rc::clone(&self.top_level);

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                self.environment = Rc::clone(&self.top_level);
                self.out.flush()?;
                return Err(e);
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt<'a>) -> Result<Flow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => self.execute_print(expr),

            Stmt::Var { name, initializer } => self.execute_var(name, initializer.as_ref()),

            Stmt::Block(statements) => {
                let environment: EnvRef<'a> = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => self.execute_function(declaration),

            Stmt::Return { value, .. } => {
                let value: Value<'a> = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Class { name, methods } => self.execute_class(name, methods),
        }
    }

    // Per-node helpers.  `execute` and `evaluate` only dispatch; anything
    // heavier lives here, off the recursive path's stack frame.

    fn execute_print(&mut self, expr: &Expr<'a>) -> Result<Flow<'a>> {
        let value: Value<'a> = self.evaluate(expr)?;
        writeln!(self.out, "{}", value)?;
        debug!("Printed value: {}", value);
        Ok(Flow::Normal)
    }

    fn execute_var(&mut self, name: &Token<'_>, initializer: Option<&Expr<'a>>) -> Result<Flow<'a>> {
        let value: Value<'a> = match initializer {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };

        debug!("Variable '{}' defined with value: {}", name.lexeme, value);

        self.environment.borrow_mut().define(name.lexeme, value);
        Ok(Flow::Normal)
    }

    fn execute_function(&mut self, declaration: &Rc<FunctionDecl<'a>>) -> Result<Flow<'a>> {
        debug!("Defining function '{}'", declaration.name.lexeme);

        let function = LoxFunction::new(
            Rc::clone(declaration),
            Rc::clone(&self.environment),
            false,
        );

        self.environment
            .borrow_mut()
            .define(declaration.name.lexeme, Value::Function(Rc::new(function)));
        Ok(Flow::Normal)
    }

    fn execute_class(
        &mut self,
        name: &Token<'_>,
        methods: &[Rc<FunctionDecl<'a>>],
    ) -> Result<Flow<'a>> {
        debug!("Defining class '{}'", name.lexeme);

        let methods: HashMap<String, Rc<LoxFunction<'a>>> = methods
            .iter()
            .map(|method| {
                let function = LoxFunction::new(
                    Rc::clone(method),
                    Rc::clone(&self.environment),
                    method.name.lexeme == "init",
                );
                (method.name.lexeme.to_string(), Rc::new(function))
            })
            .collect();

        let class = LoxClass::new(name.lexeme, methods);

        self.environment
            .borrow_mut()
            .define(name.lexeme, Value::Class(Rc::new(class)));
        Ok(Flow::Normal)
    }

    /// Runs `statements` inside `environment`, then restores the previous
    /// environment whether the block finished, returned, or failed.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt<'a>],
        environment: EnvRef<'a>,
    ) -> Result<Flow<'a>> {
        let previous: EnvRef<'a> = std::mem::replace(&mut self.environment, environment);

        let mut result: Result<Flow<'a>> = Ok(Flow::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => self.evaluate_assign(*id, name, value),

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => self.evaluate_get(object, name),

            Expr::Set {
                object,
                name,
                value,
            } => self.evaluate_set(object, name, value),

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),
        }
    }

    fn evaluate_logical(
        &mut self,
        left: &Expr<'a>,
        operator: &Token<'_>,
        right: &Expr<'a>,
    ) -> Result<Value<'a>> {
        let left_val: Value<'a> = self.evaluate(left)?;

        let short_circuit: bool = if operator.token_type == TokenType::OR {
            left_val.is_truthy()
        } else {
            !left_val.is_truthy()
        };

        if short_circuit {
            Ok(left_val)
        } else {
            self.evaluate(right)
        }
    }

    fn evaluate_assign(&mut self, id: ExprId, name: &Token<'_>, value: &Expr<'a>) -> Result<Value<'a>> {
        let value: Value<'a> = self.evaluate(value)?;

        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::assign_at(&self.environment, distance, name.lexeme, value.clone())
            }
            None => self.top_level.borrow_mut().assign(name, value.clone())?,
        }

        Ok(value)
    }

    fn evaluate_get(&mut self, object: &Expr<'a>, name: &Token<'_>) -> Result<Value<'a>> {
        match self.evaluate(object)? {
            Value::Instance(instance) => LoxInstance::get(&instance, name),
            _ => Err(LoxError::runtime(name, "Only instances have properties.")),
        }
    }

    fn evaluate_set(
        &mut self,
        object: &Expr<'a>,
        name: &Token<'_>,
        value: &Expr<'a>,
    ) -> Result<Value<'a>> {
        let Value::Instance(instance) = self.evaluate(object)? else {
            return Err(LoxError::runtime(name, "Only instances have fields."));
        };

        let value: Value<'a> = self.evaluate(value)?;
        instance.borrow_mut().set(name, value.clone());

        Ok(value)
    }

    fn look_up_variable(&self, name: &Token<'_>, id: ExprId) -> Result<Value<'a>> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(Environment::get_at(&self.environment, distance, name.lexeme)),
            None => self.top_level.borrow().get(name),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token<'_>, right: &Expr<'a>) -> Result<Value<'a>> {
        let right_val: Value<'a> = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),

            _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr<'a>,
        operator: &Token<'_>,
        right: &Expr<'a>,
    ) -> Result<Value<'a>> {
        let left_val: Value<'a> = self.evaluate(left)?;
        let right_val: Value<'a> = self.evaluate(right)?;

        trace!("Binary {} on {} and {}", operator.lexeme, left_val, right_val);

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            // IEEE‑754: x / 0 is ±inf or NaN, not an error.
            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
        }
    }

    fn evaluate_call(
        &mut self,
        callee: &Expr<'a>,
        paren: &Token<'_>,
        arguments: &[Expr<'a>],
    ) -> Result<Value<'a>> {
        let callee_val: Value<'a> = self.evaluate(callee)?;

        let mut arg_values: Vec<Value<'a>> = Vec::with_capacity(arguments.len());
        for arg in arguments {
            arg_values.push(self.evaluate(arg)?);
        }

        let Some(callable) = callee_val.as_callable() else {
            debug!("Attempted to call a {}", callee_val.type_name());
            return Err(LoxError::runtime(paren, "Can only call functions and classes."));
        };

        if arg_values.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arg_values.len()
                ),
            ));
        }

        callable.call(self, arg_values)
    }
}

fn literal_value<'a>(literal: &LiteralValue) -> Value<'a> {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn number_operands(operator: &Token<'_>, left: &Value<'_>, right: &Value<'_>) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    }
}
