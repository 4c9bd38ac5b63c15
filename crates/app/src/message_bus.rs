//! In-process message bus dispatching commands and the events they cascade
//! into.
//!
//! A command has exactly one handler and its failure aborts [`MessageBus::handle`].
//! An event may have any number of handlers, run in registration order; a
//! failing event handler is logged and does not stop its siblings nor the
//! rest of the cascade.

use std::collections::{HashMap, VecDeque};

use switchhub_domain::command::{Command, CommandKind, CommandMessage};
use switchhub_domain::event::{Event, EventKind};

use crate::error::{AppError, BusError};

/// Upper bound on messages dispatched by a single [`MessageBus::handle`] call.
pub const DEFAULT_MAX_DISPATCH: usize = 1024;

/// Anything the bus can dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Command(Command),
    Event(Event),
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

type CommandHandler<C> = Box<dyn Fn(&Command, &mut C) -> Result<Vec<Event>, AppError>>;
type EventHandler<C> = Box<dyn Fn(&Event, &mut C) -> Result<Vec<Event>, AppError>>;

struct NamedEventHandler<C> {
    name: &'static str,
    handler: EventHandler<C>,
}

/// Message bus owning the collaborators handlers run against.
///
/// `C` is the handler context, built once by the bootstrap step. Handlers
/// are closures receiving the message and `&mut C`, returning the events
/// they produced.
pub struct MessageBus<C> {
    context: C,
    command_handlers: HashMap<CommandKind, Vec<CommandHandler<C>>>,
    event_handlers: HashMap<EventKind, Vec<NamedEventHandler<C>>>,
    max_dispatch: usize,
}

impl<C: 'static> MessageBus<C> {
    /// Create a bus with no handlers registered.
    #[must_use]
    pub fn new(context: C) -> Self {
        Self {
            context,
            command_handlers: HashMap::new(),
            event_handlers: HashMap::new(),
            max_dispatch: DEFAULT_MAX_DISPATCH,
        }
    }

    /// Change the dispatch ceiling of a single [`handle`](Self::handle) call.
    #[must_use]
    pub fn with_max_dispatch(mut self, max_dispatch: usize) -> Self {
        self.max_dispatch = max_dispatch;
        self
    }

    #[must_use]
    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Register the handler of command type `M`.
    ///
    /// Registering a second handler for the same command makes
    /// [`handle`](Self::handle) fail with [`BusError::AmbiguousHandler`].
    pub fn register_command<M, F>(&mut self, handler: F)
    where
        M: CommandMessage + 'static,
        F: Fn(&M, &mut C) -> Result<Vec<Event>, AppError> + 'static,
    {
        let wrapped = move |command: &Command, context: &mut C| -> Result<Vec<Event>, AppError> {
            let message = M::from_command(command)
                .ok_or_else(|| AppError::UnexpectedMessage(command.kind().to_string()))?;
            handler(message, context)
        };
        self.command_handlers
            .entry(M::KIND)
            .or_default()
            .push(Box::new(wrapped));
    }

    /// Append a handler for events of `kind`.
    pub fn register_event<F>(&mut self, kind: EventKind, name: &'static str, handler: F)
    where
        F: Fn(&Event, &mut C) -> Result<Vec<Event>, AppError> + 'static,
    {
        self.event_handlers
            .entry(kind)
            .or_default()
            .push(NamedEventHandler {
                name,
                handler: Box::new(handler),
            });
    }

    /// Dispatch `message` and every event it cascades into, until the work
    /// queue is empty.
    ///
    /// Returns the events dispatched, in dispatch order.
    ///
    /// # Errors
    ///
    /// Returns the command handler's error, [`BusError::MissingHandler`] or
    /// [`BusError::AmbiguousHandler`] for a command without exactly one
    /// handler, and [`BusError::DispatchLimitExceeded`] when the ceiling is
    /// reached before the initial message was handled.
    ///
    /// Once the initial message has been handled, reaching the ceiling only
    /// drops the remaining events: the command already committed.
    pub fn handle(&mut self, message: impl Into<Message>) -> Result<Vec<Event>, AppError> {
        let mut queue = VecDeque::from([message.into()]);
        let mut dispatched = 0_usize;
        let mut handled_events = Vec::new();

        while let Some(message) = queue.pop_front() {
            if dispatched == self.max_dispatch {
                if dispatched == 0 {
                    return Err(BusError::DispatchLimitExceeded {
                        limit: self.max_dispatch,
                    }
                    .into());
                }
                tracing::error!(
                    limit = self.max_dispatch,
                    dropped = queue.len() + 1,
                    "dispatch ceiling reached, dropping remaining events"
                );
                break;
            }
            dispatched += 1;
            let produced = match message {
                Message::Command(command) => self.dispatch_command(&command)?,
                Message::Event(event) => {
                    let produced = self.dispatch_event(&event);
                    handled_events.push(event);
                    produced
                }
            };
            queue.extend(produced.into_iter().map(Message::Event));
        }

        Ok(handled_events)
    }

    #[tracing::instrument(skip_all, fields(command = %command.kind()))]
    fn dispatch_command(&mut self, command: &Command) -> Result<Vec<Event>, AppError> {
        let kind = command.kind();
        let handlers = self
            .command_handlers
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default();
        match handlers {
            [handler] => {
                tracing::debug!("handling command");
                handler(command, &mut self.context)
            }
            [] => Err(BusError::MissingHandler(kind).into()),
            _ => Err(BusError::AmbiguousHandler {
                kind,
                count: handlers.len(),
            }
            .into()),
        }
    }

    #[tracing::instrument(skip_all, fields(event = %event.kind()))]
    fn dispatch_event(&mut self, event: &Event) -> Vec<Event> {
        let Some(handlers) = self.event_handlers.get(&event.kind()) else {
            tracing::debug!("no handler registered");
            return Vec::new();
        };
        let mut produced = Vec::new();
        for NamedEventHandler { name, handler } in handlers {
            tracing::debug!(handler = name, "handling event");
            match handler(event, &mut self.context) {
                Ok(events) => produced.extend(events),
                Err(err) => tracing::error!(handler = name, error = %err, "event handler failed"),
            }
        }
        produced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchhub_domain::command::{Register, Unregister};
    use switchhub_domain::id::UserId;

    #[derive(Default)]
    struct Trace {
        calls: Vec<String>,
    }

    fn registered(uid: UserId) -> Event {
        Event::UserRegistered { uid }
    }

    fn register_cmd() -> Command {
        Command::from(Register {
            secret: "s1".to_string(),
            token: "t1".to_string(),
        })
    }

    #[test]
    fn should_fail_when_command_has_no_handler() {
        let mut bus = MessageBus::new(Trace::default());
        let result = bus.handle(register_cmd());
        assert!(matches!(
            result,
            Err(AppError::Bus(BusError::MissingHandler(CommandKind::Register)))
        ));
    }

    #[test]
    fn should_fail_when_command_has_two_handlers() {
        let mut bus = MessageBus::new(Trace::default());
        bus.register_command(|_: &Register, _| Ok(Vec::new()));
        bus.register_command(|_: &Register, _| Ok(Vec::new()));

        let result = bus.handle(register_cmd());
        assert!(matches!(
            result,
            Err(AppError::Bus(BusError::AmbiguousHandler { count: 2, .. }))
        ));
    }

    #[test]
    fn should_propagate_command_handler_error() {
        let mut bus = MessageBus::new(Trace::default());
        bus.register_command(|cmd: &Unregister, _| Err(AppError::user_not_found(cmd.uid)));

        let result = bus.handle(Command::from(Unregister { uid: UserId::new() }));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn should_cascade_events_breadth_first() {
        let uid = UserId::new();
        let mut bus = MessageBus::new(Trace::default());
        bus.register_command(move |_: &Register, trace: &mut Trace| {
            trace.calls.push("register".to_string());
            Ok(vec![registered(uid), Event::UserWebhookUpdated { uid }])
        });
        bus.register_event(EventKind::UserRegistered, "fetch", move |_, trace| {
            trace.calls.push("fetch".to_string());
            Ok(vec![Event::UserDevListFetched { uid }])
        });
        bus.register_event(EventKind::UserWebhookUpdated, "webhook", |_, trace| {
            trace.calls.push("webhook".to_string());
            Ok(Vec::new())
        });
        bus.register_event(EventKind::UserDevListFetched, "states", |_, trace| {
            trace.calls.push("states".to_string());
            Ok(Vec::new())
        });

        let handled = bus.handle(register_cmd()).unwrap();

        assert_eq!(bus.context().calls, vec!["register", "fetch", "webhook", "states"]);
        let kinds: Vec<EventKind> = handled.iter().map(Event::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::UserRegistered,
                EventKind::UserWebhookUpdated,
                EventKind::UserDevListFetched
            ]
        );
    }

    #[test]
    fn should_run_sibling_event_handlers_when_one_fails() {
        let uid = UserId::new();
        let mut bus = MessageBus::new(Trace::default());
        bus.register_event(EventKind::UserRegistered, "failing", |_, trace: &mut Trace| {
            trace.calls.push("failing".to_string());
            Err(AppError::user_not_found("x"))
        });
        bus.register_event(EventKind::UserRegistered, "working", |_, trace| {
            trace.calls.push("working".to_string());
            Ok(Vec::new())
        });

        let result = bus.handle(registered(uid));

        assert!(result.is_ok());
        assert_eq!(bus.context().calls, vec!["failing", "working"]);
    }

    #[test]
    fn should_ignore_event_without_handler() {
        let mut bus = MessageBus::new(Trace::default());
        let handled = bus.handle(registered(UserId::new())).unwrap();
        assert_eq!(handled.len(), 1);
    }

    #[test]
    fn should_stop_cycle_when_dispatch_limit_reached() {
        let uid = UserId::new();
        let mut bus = MessageBus::new(Trace::default()).with_max_dispatch(8);
        bus.register_event(EventKind::UserRequestReload, "loop", move |_, trace| {
            trace.calls.push("loop".to_string());
            Ok(vec![Event::UserRequestReload { uid }])
        });

        let handled = bus.handle(Event::UserRequestReload { uid }).unwrap();

        assert_eq!(handled.len(), 8);
        assert_eq!(bus.context().calls.len(), 8);
    }

    #[test]
    fn should_succeed_when_ceiling_is_reached_after_command() {
        let uid = UserId::new();
        let mut bus = MessageBus::new(Trace::default()).with_max_dispatch(2);
        bus.register_command(move |_: &Register, trace: &mut Trace| {
            trace.calls.push("register".to_string());
            Ok(vec![registered(uid), Event::UserWebhookUpdated { uid }])
        });

        let handled = bus.handle(register_cmd()).unwrap();

        assert_eq!(handled, vec![registered(uid)]);
        assert_eq!(bus.context().calls, vec!["register"]);
    }

    #[test]
    fn should_fail_when_ceiling_leaves_no_room_for_command() {
        let mut bus = MessageBus::new(Trace::default()).with_max_dispatch(0);
        bus.register_command(|_: &Register, trace: &mut Trace| {
            trace.calls.push("register".to_string());
            Ok(Vec::new())
        });

        let result = bus.handle(register_cmd());

        assert!(matches!(
            result,
            Err(AppError::Bus(BusError::DispatchLimitExceeded { limit: 0 }))
        ));
        assert!(bus.context().calls.is_empty());
    }
}
