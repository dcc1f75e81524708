//! Shared test utilities: recording transport sinks and a tracing capture
//! guard for asserting on log severity.
#![allow(dead_code)]

use chaincore::request::{ParamVec, Request};
use chaincore::sink::ResponseSink;
use http::Method;
use std::io;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::Layer;

/// Everything a sink received from the core, inspectable after the context
/// has consumed the boxed sink.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub status: Option<u16>,
    pub reason: Option<&'static str>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub status_writes: usize,
    pub body_writes: usize,
}

impl Recorded {
    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Transport sink double that records every call into shared state.
pub struct RecordingSink {
    state: Arc<Mutex<Recorded>>,
}

impl RecordingSink {
    /// Returns the boxed sink to hand to the core and the shared view to
    /// assert on afterwards.
    pub fn new() -> (Box<dyn ResponseSink + Send>, Arc<Mutex<Recorded>>) {
        let state = Arc::new(Mutex::new(Recorded::default()));
        let sink = Box::new(RecordingSink {
            state: Arc::clone(&state),
        });
        (sink, state)
    }
}

impl ResponseSink for RecordingSink {
    fn write_status(&mut self, status: u16, reason: &'static str) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.status = Some(status);
        state.reason = Some(reason);
        state.status_writes += 1;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.body.extend_from_slice(buf);
        state.body_writes += 1;
        Ok(buf.len())
    }

    fn set_header(&mut self, name: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        state.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        state.headers.push((name.to_string(), value.to_string()));
    }

    fn remove_header(&mut self, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }
}

/// Sink whose writes always fail, for exercising the fire-and-forget policy.
pub struct BrokenSink;

impl ResponseSink for BrokenSink {
    fn write_status(&mut self, _status: u16, _reason: &'static str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
    }

    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
    }

    fn set_header(&mut self, _name: &str, _value: &str) {}

    fn remove_header(&mut self, _name: &str) {}
}

pub fn get_request(path: &str) -> Request {
    Request::new(Method::GET, path)
}

pub fn params(pairs: &[(&str, &str)]) -> ParamVec {
    let mut params = ParamVec::new();
    for (k, v) in pairs {
        params.push((Arc::from(*k), (*v).to_string()));
    }
    params
}

/// One captured log event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: String,
}

#[derive(Clone, Default)]
struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: String,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        use std::fmt::Write;
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, "{}={:?} ", field.name(), value);
        }
    }
}

/// Installs a capturing subscriber for the current thread and hands events
/// back for assertions. Dropping the guard uninstalls it.
pub struct TestTracing {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestTracing {
    pub fn init() -> Self {
        let layer = CaptureLayer::default();
        let events = Arc::clone(&layer.events);
        let subscriber = Registry::default().with(layer);
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            events,
            _guard: guard,
        }
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_at(&self, level: Level) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }

    pub fn has_event_at(&self, level: Level) -> bool {
        !self.events_at(level).is_empty()
    }
}
