//! Composition of the message bus: the registration table binding every
//! command and event kind to its handlers and their collaborators.

use switchhub_domain::command::{
    Disconnect, Register, ReportChange, ReportState, RequestSync, SendDevCtrlCmd, Subscribe,
    Unregister, Unsubscribe,
};
use switchhub_domain::event::EventKind;

use crate::handlers;
use crate::message_bus::{DEFAULT_MAX_DISPATCH, MessageBus};
use crate::ports::{IotApi, SubscriberNotifier, UnitOfWork};

/// Webhook URL used when none is configured.
pub const DEFAULT_WEBHOOK_URL: &str = "http://127.0.0.1:5000/change";

/// Collaborators owned by the bus and lent to handlers.
pub struct Context<U, I, N> {
    pub uow: U,
    pub iot: I,
    pub notifier: N,
    pub webhook_url: String,
}

/// The bus type produced by [`Bootstrap::build`].
pub type SwitchHubBus<U, I, N> = MessageBus<Context<U, I, N>>;

/// Builder wiring adapters into a ready-to-use [`MessageBus`].
///
/// ```ignore
/// let bus = Bootstrap::new(uow, iot, notifier)
///     .webhook_url("https://hub.example.com/change")
///     .build();
/// ```
pub struct Bootstrap<U, I, N> {
    uow: U,
    iot: I,
    notifier: N,
    webhook_url: String,
    max_dispatch: usize,
}

impl<U, I, N> Bootstrap<U, I, N>
where
    U: UnitOfWork + 'static,
    I: IotApi + 'static,
    N: SubscriberNotifier + 'static,
{
    #[must_use]
    pub fn new(uow: U, iot: I, notifier: N) -> Self {
        Self {
            uow,
            iot,
            notifier,
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            max_dispatch: DEFAULT_MAX_DISPATCH,
        }
    }

    /// URL the vendor webhook is pointed at.
    #[must_use]
    pub fn webhook_url(mut self, webhook_url: impl Into<String>) -> Self {
        self.webhook_url = webhook_url.into();
        self
    }

    #[must_use]
    pub fn max_dispatch(mut self, max_dispatch: usize) -> Self {
        self.max_dispatch = max_dispatch;
        self
    }

    /// Build the bus with the default registration table.
    #[must_use]
    pub fn build(self) -> SwitchHubBus<U, I, N> {
        let context = Context {
            uow: self.uow,
            iot: self.iot,
            notifier: self.notifier,
            webhook_url: self.webhook_url,
        };
        let mut bus = MessageBus::new(context).with_max_dispatch(self.max_dispatch);
        register_commands(&mut bus);
        register_events(&mut bus);
        bus
    }
}

fn register_commands<U, I, N>(bus: &mut SwitchHubBus<U, I, N>)
where
    U: UnitOfWork + 'static,
    I: IotApi + 'static,
    N: SubscriberNotifier + 'static,
{
    bus.register_command(|cmd: &Register, ctx: &mut Context<U, I, N>| {
        handlers::register(cmd, &mut ctx.uow)
    });
    bus.register_command(|cmd: &Unregister, ctx: &mut Context<U, I, N>| {
        handlers::unregister(cmd, &mut ctx.uow)
    });
    bus.register_command(|cmd: &Subscribe, ctx: &mut Context<U, I, N>| {
        handlers::subscribe(cmd, &mut ctx.uow)
    });
    bus.register_command(|cmd: &Unsubscribe, ctx: &mut Context<U, I, N>| {
        handlers::unsubscribe(cmd, &mut ctx.uow)
    });
    bus.register_command(|cmd: &Disconnect, ctx: &mut Context<U, I, N>| {
        handlers::disconnect(cmd, &mut ctx.uow)
    });
    bus.register_command(|cmd: &RequestSync, ctx: &mut Context<U, I, N>| {
        handlers::request_sync(cmd, &mut ctx.uow)
    });
    bus.register_command(|cmd: &ReportState, ctx: &mut Context<U, I, N>| {
        handlers::report_state(cmd, &mut ctx.uow)
    });
    bus.register_command(|cmd: &ReportChange, ctx: &mut Context<U, I, N>| {
        handlers::report_change(cmd, &mut ctx.uow)
    });
    bus.register_command(|cmd: &SendDevCtrlCmd, ctx: &mut Context<U, I, N>| {
        handlers::send_dev_ctrl_cmd(cmd, &mut ctx.uow, &ctx.iot)
    });
}

fn register_events<U, I, N>(bus: &mut SwitchHubBus<U, I, N>)
where
    U: UnitOfWork + 'static,
    I: IotApi + 'static,
    N: SubscriberNotifier + 'static,
{
    for kind in [EventKind::UserRegistered, EventKind::UserRequestReload] {
        bus.register_event(kind, "fetch_dev_list", |event, ctx| {
            handlers::fetch_dev_list(event, &mut ctx.uow, &ctx.iot)
        });
    }
    bus.register_event(
        EventKind::UserDevListFetched,
        "fetch_dev_all_states",
        |event, ctx| handlers::fetch_dev_all_states(event, &mut ctx.uow, &ctx.iot),
    );
    bus.register_event(
        EventKind::UserDevListChanged,
        "notify_dev_list_changed",
        |event, ctx| handlers::notify_dev_list_changed(event, &mut ctx.uow, &ctx.notifier),
    );
    bus.register_event(
        EventKind::UserDevStatesAllFetched,
        "setup_webhook",
        |event, ctx| handlers::setup_webhook(event, &mut ctx.uow, &ctx.iot, &ctx.webhook_url),
    );
    bus.register_event(
        EventKind::UserDevReportChanged,
        "refresh_reported_dev_state",
        |event, ctx| handlers::refresh_reported_dev_state(event, &mut ctx.uow, &ctx.iot),
    );
    bus.register_event(
        EventKind::UserDevStateChanged,
        "report_dev_state",
        |event, ctx| handlers::report_dev_state(event, &mut ctx.uow, &ctx.notifier),
    );
    bus.register_event(EventKind::UserWebhookUpdated, "log_webhook_updated", |event, _| {
        handlers::log_webhook_updated(event)
    });
}
