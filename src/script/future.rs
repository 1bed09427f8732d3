//! Futures: values completed by host tasks and delivered to scripts on the
//! UI thread.
//!
//! A [`FutureCompleter`] is `Send`; background tasks resolve it and the
//! outcome travels through an unbounded channel. Nothing reaches the Lua
//! state until the host calls [`FutureQueue::pump`] (or awaits
//! [`FutureQueue::wait_pending`]), so script callbacks always run on the
//! thread that owns the state.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use mlua::prelude::*;
use mlua::{MetaMethod, UserData, UserDataMethods};
use tokio::sync::mpsc;

use super::convert::Args;
use crate::error::{Error, Result};

/// A plain value that can cross threads into a future outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Nil,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl IntoLua for ScriptValue {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        Ok(match self {
            ScriptValue::Nil => LuaValue::Nil,
            ScriptValue::Bool(b) => LuaValue::Boolean(b),
            ScriptValue::Integer(i) => LuaValue::Integer(i),
            ScriptValue::Number(n) => LuaValue::Number(n),
            ScriptValue::String(s) => LuaValue::String(lua.create_string(&s)?),
        })
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::String(s.to_string())
    }
}

impl From<i64> for ScriptValue {
    fn from(i: i64) -> Self {
        ScriptValue::Integer(i)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

type Outcome = std::result::Result<ScriptValue, String>;

#[derive(Default)]
struct FutureState {
    outcome: Option<Outcome>,
    callbacks: Vec<LuaFunction>,
}

type Shared = Rc<RefCell<FutureState>>;

/// Completes one future from any thread. Dropping it unresolved rejects the
/// future with `"future dropped"`.
pub struct FutureCompleter {
    id: u64,
    tx: Option<mpsc::UnboundedSender<(u64, Outcome)>>,
}

impl FutureCompleter {
    pub fn resolve(mut self, value: impl Into<ScriptValue>) {
        self.send(Ok(value.into()));
    }

    pub fn reject(mut self, message: impl Into<String>) {
        self.send(Err(message.into()));
    }

    fn send(&mut self, outcome: Outcome) {
        if let Some(tx) = self.tx.take() {
            // The queue is gone with its Lua state; nobody is left to notify.
            let _ = tx.send((self.id, outcome));
        }
    }
}

impl Drop for FutureCompleter {
    fn drop(&mut self) {
        self.send(Err("future dropped".to_string()));
    }
}

/// Script side of a future.
pub struct ScriptFuture {
    id: u64,
    state: Shared,
    queue: FutureQueue,
}

impl UserData for ScriptFuture {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        // `f:when(function(ok, value_or_message) ... end)`
        methods.add_function("when", |_, (ud, callback): (LuaAnyUserData, LuaFunction)| {
            {
                let this = ud.borrow::<ScriptFuture>()?;
                let mut state = this.state.borrow_mut();
                if state.outcome.is_some() {
                    this.queue.defer(this.id, this.state.clone());
                }
                state.callbacks.push(callback);
            }
            Ok(ud)
        });
        methods.add_method("isReady", |_, this, ()| Ok(this.state.borrow().outcome.is_some()));
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            let status = match &this.state.borrow().outcome {
                None => "pending",
                Some(Ok(_)) => "resolved",
                Some(Err(_)) => "rejected",
            };
            Ok(format!("Future#{}({status})", this.id))
        });
    }
}

struct QueueInner {
    tx: mpsc::UnboundedSender<(u64, Outcome)>,
    rx: RefCell<Option<mpsc::UnboundedReceiver<(u64, Outcome)>>>,
    pending: RefCell<HashMap<u64, Shared>>,
    deferred: RefCell<Vec<(u64, Shared)>>,
    next_id: Cell<u64>,
}

/// Futures created by one Lua state. Cloning shares the queue.
#[derive(Clone)]
pub struct FutureQueue(Rc<QueueInner>);

impl Default for FutureQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FutureQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        FutureQueue(Rc::new(QueueInner {
            tx,
            rx: RefCell::new(Some(rx)),
            pending: RefCell::new(HashMap::new()),
            deferred: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }))
    }

    /// The queue installed in `lua`.
    pub fn of(lua: &Lua) -> Result<FutureQueue> {
        lua.app_data_ref::<FutureQueue>()
            .map(|q| (*q).clone())
            .ok_or_else(|| Error::invalid("future", "no future queue attached to this Lua state"))
    }

    /// A new pending future and the completer that settles it.
    pub fn create(&self) -> (ScriptFuture, FutureCompleter) {
        let id = self.0.next_id.get() + 1;
        self.0.next_id.set(id);
        let state = Shared::default();
        self.0.pending.borrow_mut().insert(id, state.clone());
        let future = ScriptFuture { id, state, queue: self.clone() };
        let completer = FutureCompleter { id, tx: Some(self.0.tx.clone()) };
        (future, completer)
    }

    /// Futures not yet delivered.
    pub fn pending(&self) -> usize {
        self.0.pending.borrow().len()
    }

    fn defer(&self, id: u64, state: Shared) {
        self.0.deferred.borrow_mut().push((id, state));
    }

    /// Deliver every outcome received so far. Returns how many futures
    /// settled. Callback failures are logged and do not stop delivery.
    pub fn pump(&self) -> Result<usize> {
        let mut settled = 0;
        let received: Vec<(u64, Outcome)> = {
            let mut rx = self.0.rx.borrow_mut();
            let Some(rx) = rx.as_mut() else {
                return Err(Error::invalid("pump", "future queue is already being awaited"));
            };
            std::iter::from_fn(|| rx.try_recv().ok()).collect()
        };
        for (id, outcome) in received {
            if self.settle(id, outcome) {
                settled += 1;
            }
        }
        let deferred = std::mem::take(&mut *self.0.deferred.borrow_mut());
        for (id, state) in deferred {
            self.run_callbacks(id, &state);
        }
        Ok(settled)
    }

    /// Wait until every created future has settled, delivering outcomes as
    /// they arrive.
    pub async fn wait_pending(&self) -> Result<()> {
        self.pump()?;
        while self.pending() > 0 {
            let Some(mut rx) = self.0.rx.borrow_mut().take() else {
                return Err(Error::invalid("wait_pending", "future queue is already being awaited"));
            };
            let next = rx.recv().await;
            *self.0.rx.borrow_mut() = Some(rx);
            match next {
                Some((id, outcome)) => {
                    self.settle(id, outcome);
                    self.pump()?;
                }
                None => break,
            }
        }
        Ok(())
    }

    fn settle(&self, id: u64, outcome: Outcome) -> bool {
        let Some(state) = self.0.pending.borrow_mut().remove(&id) else {
            return false;
        };
        tracing::trace!(future = id, ok = outcome.is_ok(), "future settled");
        state.borrow_mut().outcome = Some(outcome);
        self.run_callbacks(id, &state);
        true
    }

    fn run_callbacks(&self, id: u64, state: &Shared) {
        let (callbacks, outcome) = {
            let mut s = state.borrow_mut();
            let Some(outcome) = s.outcome.clone() else {
                return;
            };
            (std::mem::take(&mut s.callbacks), outcome)
        };
        for callback in callbacks {
            let result = match &outcome {
                Ok(value) => callback.call::<()>((true, value.clone())),
                Err(message) => callback.call::<()>((false, message.as_str())),
            };
            if let Err(err) = result {
                tracing::warn!(future = id, error = %err, "future callback failed");
            }
        }
    }
}

/// `delay(ms)`: a future resolved with `true` after `ms` milliseconds. Needs
/// a tokio runtime on the calling thread.
pub fn delay(lua: &Lua, values: LuaMultiValue) -> LuaResult<ScriptFuture> {
    let args = Args::new("delay", values);
    args.arity(1, 1)?;
    let ms: u32 = args.get(0)?;
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|_| Error::invalid("delay", "no tokio runtime available"))?;
    let (future, completer) = FutureQueue::of(lua)?.create();
    handle.spawn(async move {
        tokio::time::sleep(Duration::from_millis(u64::from(ms))).await;
        completer.resolve(true);
    });
    Ok(future)
}

pub fn register(lua: &Lua) -> LuaResult<()> {
    lua.globals().set("delay", lua.create_function(delay)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lua() -> (Lua, FutureQueue) {
        let lua = Lua::new();
        let queue = FutureQueue::new();
        lua.set_app_data(queue.clone());
        register(&lua).unwrap();
        lua.globals().set("log", lua.create_table().unwrap()).unwrap();
        (lua, queue)
    }

    fn log(lua: &Lua) -> Vec<String> {
        let t: LuaTable = lua.globals().get("log").unwrap();
        t.sequence_values::<String>().map(|v| v.unwrap()).collect()
    }

    const RECORD: &str = "function(ok, v) table.insert(log, tostring(ok) .. ':' .. tostring(v)) end";

    #[test]
    fn outcome_waits_for_pump() {
        let (lua, queue) = lua();
        let (future, completer) = queue.create();
        lua.globals().set("f", future).unwrap();
        lua.load(format!("f:when({RECORD})")).exec().unwrap();
        completer.resolve(7_i64);
        assert!(log(&lua).is_empty());
        assert_eq!(queue.pump().unwrap(), 1);
        assert_eq!(log(&lua), ["true:7"]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn late_subscriber_is_called_on_next_pump() {
        let (lua, queue) = lua();
        let (future, completer) = queue.create();
        lua.globals().set("f", future).unwrap();
        completer.reject("nope");
        queue.pump().unwrap();
        lua.load(format!("f:when({RECORD})")).exec().unwrap();
        assert!(log(&lua).is_empty());
        queue.pump().unwrap();
        assert_eq!(log(&lua), ["false:nope"]);
        let ready: bool = lua.load("return f:isReady()").eval().unwrap();
        assert!(ready);
    }

    #[test]
    fn dropped_completer_rejects() {
        let (lua, queue) = lua();
        let (future, completer) = queue.create();
        lua.globals().set("f", future).unwrap();
        lua.load(format!("f:when({RECORD})")).exec().unwrap();
        drop(completer);
        queue.pump().unwrap();
        assert_eq!(log(&lua), ["false:future dropped"]);
    }

    #[test]
    fn failing_callback_does_not_stop_delivery() {
        let (lua, queue) = lua();
        let (future, completer) = queue.create();
        lua.globals().set("f", future).unwrap();
        lua.load(format!("f:when(function() error('boom') end):when({RECORD})")).exec().unwrap();
        completer.resolve("x");
        queue.pump().unwrap();
        assert_eq!(log(&lua), ["true:x"]);
    }

    #[test]
    fn delay_needs_a_runtime() {
        let (lua, _queue) = lua();
        let err = lua.load("delay(10)").exec().unwrap_err();
        assert!(err.to_string().contains("delay: no tokio runtime available"), "{err}");
    }

    #[test]
    fn wait_pending_completes_only_after_settlement() {
        let (lua, queue) = lua();
        let (future, completer) = queue.create();
        lua.globals().set("f", future).unwrap();
        lua.load(format!("f:when({RECORD})")).exec().unwrap();

        let mut wait = tokio_test::task::spawn(queue.wait_pending());
        tokio_test::assert_pending!(wait.poll());
        completer.resolve("late");
        assert!(wait.is_woken());
        tokio_test::assert_ready_ok!(wait.poll());
        drop(wait);
        assert_eq!(log(&lua), ["true:late"]);
    }

    #[tokio::test]
    async fn delay_resolves_after_wait() {
        let (lua, queue) = lua();
        lua.load(format!("delay(1):when({RECORD})")).exec().unwrap();
        assert_eq!(queue.pending(), 1);
        queue.wait_pending().await.unwrap();
        assert_eq!(log(&lua), ["true:true"]);
    }
}
