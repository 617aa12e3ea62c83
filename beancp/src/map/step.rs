use std::fmt;
use std::sync::Arc;

use crate::convention::ConventionExecutor;
use crate::error::Result;
use crate::mapper::Mapper;

/// The statements a map configuration is made of, used for ordering checks
/// and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statement {
    ConstructDestinationUsing,
    BeforeMap,
    UseConvention,
    Bind,
    BindConstant,
    MapInner,
    AfterMap,
}

impl Statement {
    /// Position in the mandatory order. Statements of equal rank may be
    /// interleaved.
    pub fn rank(self) -> u8 {
        match self {
            Statement::ConstructDestinationUsing => 0,
            Statement::BeforeMap => 1,
            Statement::UseConvention => 2,
            Statement::Bind | Statement::BindConstant | Statement::MapInner => 3,
            Statement::AfterMap => 4,
        }
    }

    /// Statements allowed at most once per map.
    pub fn is_unique(self) -> bool {
        matches!(self, Statement::ConstructDestinationUsing | Statement::UseConvention)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Statement::ConstructDestinationUsing => "construct_destination_using",
            Statement::BeforeMap => "before_map",
            Statement::UseConvention => "use_convention",
            Statement::Bind => "bind",
            Statement::BindConstant => "bind_constant",
            Statement::MapInner => "map_inner",
            Statement::AfterMap => "after_map",
        };
        f.write_str(name)
    }
}

/// State of one `map` call, handed to every step.
pub(crate) struct ExecutionContext<'a, S, D> {
    pub(crate) caller: &'a Mapper,
    pub(crate) source: &'a S,
    pub(crate) destination: &'a mut D,
}

pub(crate) type Builder<D> = Arc<dyn Fn() -> D + Send + Sync>;
pub(crate) type Hook<S, D> = Box<dyn Fn(&Mapper, &S, &mut D) -> Result<()> + Send + Sync>;
pub(crate) type Action<S, D> = Box<dyn Fn(&mut ExecutionContext<'_, S, D>) -> Result<()> + Send + Sync>;

/// One recorded statement of a map configuration.
pub(crate) enum Step<S, D> {
    ConstructDestination(Builder<D>),
    BeforeMap(Hook<S, D>),
    UseConvention(ConventionExecutor),
    Bind(Action<S, D>),
    BindConstant(Action<S, D>),
    MapInner(Action<S, D>),
    AfterMap(Hook<S, D>),
}

impl<S: 'static, D: 'static> Step<S, D> {
    pub(crate) fn statement(&self) -> Statement {
        match self {
            Step::ConstructDestination(_) => Statement::ConstructDestinationUsing,
            Step::BeforeMap(_) => Statement::BeforeMap,
            Step::UseConvention(_) => Statement::UseConvention,
            Step::Bind(_) => Statement::Bind,
            Step::BindConstant(_) => Statement::BindConstant,
            Step::MapInner(_) => Statement::MapInner,
            Step::AfterMap(_) => Statement::AfterMap,
        }
    }

    pub(crate) fn run(&self, cx: &mut ExecutionContext<'_, S, D>) -> Result<()> {
        match self {
            // Applied by the executor when it creates a destination.
            Step::ConstructDestination(_) => Ok(()),
            Step::BeforeMap(hook) | Step::AfterMap(hook) => hook(cx.caller, cx.source, &mut *cx.destination),
            Step::UseConvention(convention) => convention.map(cx.caller, cx.source, &mut *cx.destination),
            Step::Bind(action) | Step::BindConstant(action) | Step::MapInner(action) => action(cx),
        }
    }
}
