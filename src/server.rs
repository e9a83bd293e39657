//! `tally serve`: the daily scheduler plus a small HTTP listener for the manual trigger.
//!
//! Both entry points share one lock, so this process never runs two passes at once.

use std::{
    io,
    net::TcpListener,
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::Utc;
use serde_json::json;
use tiny_http::{Header, Request, Response};

use tally_core::{storage::PersistenceGateway, DailyRun, DailySchedule, ManualTrigger, TriggerResponse};

use crate::{cli::AppContext, errors::CliError};

const TRIGGER_PATH: &str = "/trigger";

/// Request line and the one header the trigger cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

impl From<&Request> for HttpRequest {
    fn from(request: &Request) -> Self {
        let url = request.url();
        let path = url.split('?').next().unwrap_or(url).to_string();
        let authorization = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Authorization"))
            .map(|header| header.value.as_str().trim().to_string());
        Self {
            method: request.method().to_string(),
            path,
            authorization,
        }
    }
}

pub struct Server {
    gateway: Arc<dyn PersistenceGateway>,
    schedule: DailySchedule,
    ceiling: Duration,
    trigger: ManualTrigger,
    run_lock: Arc<Mutex<()>>,
    listen_addr: String,
}

impl Server {
    pub fn from_context(context: &AppContext) -> Result<Self, CliError> {
        let config = context.config();
        let gateway = context.gateway();
        let ceiling = config.run_ceiling();
        let trigger = ManualTrigger::new(
            DailyRun::new(gateway.clone()).with_ceiling(ceiling),
            config.admin_secret.clone(),
            Arc::new(context.clock()?),
        );
        if config.admin_secret.is_none() {
            tracing::warn!("no admin secret configured; manual trigger will reject every request");
        }
        Ok(Self {
            gateway,
            schedule: context.schedule()?,
            ceiling,
            trigger,
            run_lock: Arc::new(Mutex::new(())),
            listen_addr: config.listen_addr.clone(),
        })
    }

    /// Starts the scheduler thread and blocks serving trigger requests.
    pub fn run(self) -> Result<(), CliError> {
        let listener = TcpListener::bind(&self.listen_addr)?;
        tracing::info!(
            addr = %self.listen_addr,
            run_at = %self.schedule.run_at(),
            offset = %self.schedule.offset(),
            "tally server started"
        );
        let _scheduler = self.spawn_scheduler();
        self.serve(listener)
    }

    /// Fires the daily pass at every scheduled instant, forever.
    pub fn spawn_scheduler(&self) -> JoinHandle<()> {
        let gateway = self.gateway.clone();
        let schedule = self.schedule;
        let ceiling = self.ceiling;
        let lock = self.run_lock.clone();
        thread::spawn(move || loop {
            let now = Utc::now();
            let next = schedule.next_run_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::debug!(next = %next, "next daily recurring pass scheduled");
            thread::sleep(wait);

            let today = schedule.local_today(next);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(err) = DailyRun::new(gateway.clone()).with_ceiling(ceiling).run(today) {
                tracing::error!(%today, error = %err, "daily recurring pass failed");
            }
        })
    }

    /// Serves trigger requests on `listener` until it shuts down.
    ///
    /// Connections are read on the HTTP crate's own threads; only complete requests reach
    /// this loop, and unread request bodies are discarded once the response is sent.
    pub fn serve(&self, listener: TcpListener) -> Result<(), CliError> {
        let http = tiny_http::Server::from_listener(listener, None)
            .map_err(|err| CliError::Http(err.to_string()))?;
        for request in http.incoming_requests() {
            let parsed = HttpRequest::from(&request);
            tracing::info!(method = %parsed.method, path = %parsed.path, "trigger request");
            let response = self.route(&parsed);
            if let Err(err) = respond(request, &response) {
                tracing::warn!(error = %err, "could not answer trigger request");
            }
        }
        Ok(())
    }

    /// Routes a parsed request. Any method is accepted on the trigger path.
    pub fn route(&self, request: &HttpRequest) -> TriggerResponse {
        if request.path != TRIGGER_PATH {
            return TriggerResponse {
                status: 404,
                body: json!({ "error": "Not found" }),
            };
        }
        let _guard = self.run_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.trigger.handle(request.authorization.as_deref())
    }
}

fn respond(request: Request, response: &TriggerResponse) -> io::Result<()> {
    let mut reply = Response::from_string(response.body.to_string()).with_status_code(response.status);
    if let Ok(content_type) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        reply = reply.with_header(content_type);
    }
    request.respond(reply)
}
