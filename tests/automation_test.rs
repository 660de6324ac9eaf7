use post_automator::config::InteractionDelays;
use post_automator::dom::{el, ElementBuilder};
use post_automator::models::{AutomationSettings, RunSummary};
use post_automator::orchestrator::{
    AutomationService, BatchRunner, CommandHandler, MemoryPageHost, Orchestrator,
    OrchestratorOptions,
};
use post_automator::protocol::{ServiceCommand, ServiceResponse, Status};
use post_automator::scheduler::Trigger;
use post_automator::services::ElementResolver;
use post_automator::store::{MemoryStore, SettingsStore};
use post_automator::workflow::InteractionFlow;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_test::assert_ok;

const ACME: &str = "https://www.linkedin.com/company/acme/posts/";
const BROKEN: &str = "https://www.linkedin.com/company/broken/posts/";
const JANE: &str = "https://www.linkedin.com/in/jane/recent-activity/all/";

fn runner() -> BatchRunner {
    BatchRunner::new(
        InteractionFlow::new(ElementResolver::new(), InteractionDelays::none()),
        Duration::ZERO,
    )
}

fn options(command_timeout: Duration) -> OrchestratorOptions {
    OrchestratorOptions {
        service_host: "www.linkedin.com".to_string(),
        page_stabilize: Duration::ZERO,
        command_timeout,
    }
}

fn feed(posts: usize) -> ElementBuilder {
    (0..posts).fold(el("main"), |main, n| {
        main.child(
            el("div").class("feed-shared-update-v2").child(
                el("button")
                    .attr("id", &format!("ember{}", n))
                    .attr("aria-label", "Like")
                    .attr("aria-pressed", "false")
                    .on_click_set("aria-pressed", "true"),
            ),
        )
    })
}

fn store_with(values: Value) -> Arc<MemoryStore> {
    let map: Map<String, Value> = match values {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Arc::new(MemoryStore::with_values(map))
}

fn orchestrator(
    store: Arc<MemoryStore>,
    host: MemoryPageHost,
    command_timeout: Duration,
) -> Arc<Orchestrator<MemoryStore, MemoryPageHost>> {
    Arc::new(Orchestrator::new(
        SettingsStore::new(store),
        Arc::new(host),
        options(command_timeout),
    ))
}

async fn configuration(store: &Arc<MemoryStore>) -> post_automator::Configuration {
    SettingsStore::new(Arc::clone(store))
        .load_settings()
        .await
        .unwrap()
        .to_configuration()
        .unwrap()
}

#[tokio::test]
async fn failing_target_does_not_stop_the_run() {
    let store = store_with(json!({
        "targets": ["acme", "broken", "in/jane"],
        "postsPerTarget": 2,
    }));
    let host = MemoryPageHost::new(runner())
        .with_page(ACME, feed(3))
        .with_page(JANE, feed(1));
    let orchestrator = orchestrator(Arc::clone(&store), host, Duration::from_secs(5));

    let report = orchestrator
        .run_automation(&configuration(&store).await)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.outcomes[0].summary.as_ref().unwrap().posts_processed, 2);
    assert!(report.outcomes[1].error.as_ref().unwrap().contains(BROKEN));
    assert_eq!(report.outcomes[2].summary.as_ref().unwrap().posts_processed, 1);
    assert_eq!(report.posts_processed(), 3);

    let settings = orchestrator.settings();
    let history = settings.load_history().await.unwrap();
    let urls: Vec<&str> = history.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(urls, vec![JANE, ACME]);
    assert!(settings.last_run().await.unwrap().is_some());
}

#[tokio::test]
async fn targets_are_opened_in_order() {
    let store = store_with(json!({"targets": ["in/jane", "acme"]}));
    let host = Arc::new(
        MemoryPageHost::new(runner())
            .with_page(ACME, feed(1))
            .with_page(JANE, feed(1)),
    );
    let orchestrator = Orchestrator::new(
        SettingsStore::new(Arc::clone(&store)),
        Arc::clone(&host),
        options(Duration::from_secs(5)),
    );

    orchestrator
        .run_automation(&configuration(&store).await)
        .await
        .unwrap();
    assert_eq!(host.opened(), vec![JANE.to_string(), ACME.to_string()]);
}

#[tokio::test]
async fn unresponsive_page_times_out_and_run_continues() {
    let store = store_with(json!({"targets": ["acme", "in/jane"]}));
    let host = Arc::new(
        MemoryPageHost::new(runner())
            .with_unresponsive(ACME)
            .with_page(JANE, feed(2)),
    );
    let orchestrator = Orchestrator::new(
        SettingsStore::new(Arc::clone(&store)),
        Arc::clone(&host),
        options(Duration::from_millis(100)),
    );

    let report = orchestrator
        .run_automation(&configuration(&store).await)
        .await
        .unwrap();

    assert!(report.outcomes[0].summary.is_none());
    assert!(report.outcomes[0].error.is_some());
    assert_eq!(report.outcomes[1].summary.as_ref().unwrap().posts_processed, 2);
    assert_eq!(orchestrator.settings().load_history().await.unwrap().len(), 1);
    // 无响应的页面被丢弃，正常页面不受影响
    assert_eq!(host.discarded(), vec![ACME.to_string()]);
}

#[tokio::test]
async fn summary_uses_the_final_page_url() {
    let store = store_with(json!({"targets": ["acme"]}));
    let landed = "https://www.linkedin.com/company/acme-corp/posts/";
    let host = MemoryPageHost::new(runner()).with_redirect(ACME, landed, feed(1));
    let orchestrator = orchestrator(Arc::clone(&store), host, Duration::from_secs(5));

    orchestrator
        .run_automation(&configuration(&store).await)
        .await
        .unwrap();

    let history = orchestrator.settings().load_history().await.unwrap();
    assert_eq!(history.latest().unwrap().url, landed);
}

#[tokio::test]
async fn overlapping_run_is_rejected() {
    let store = store_with(json!({"targets": ["acme"]}));
    let host = MemoryPageHost::new(runner()).with_unresponsive(ACME);
    let orchestrator = orchestrator(Arc::clone(&store), host, Duration::from_millis(500));
    let config = configuration(&store).await;

    let first = {
        let orchestrator = Arc::clone(&orchestrator);
        let config = config.clone();
        tokio::spawn(async move { orchestrator.run_automation(&config).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = orchestrator.run_automation(&config).await;
    assert!(second.unwrap_err().is_run_in_progress());

    assert_ok!(first.await.unwrap());
}

fn service(
    store: Arc<MemoryStore>,
    host: MemoryPageHost,
) -> AutomationService<MemoryStore, MemoryPageHost> {
    let (sender, _receiver) = mpsc::channel(4);
    AutomationService::new(orchestrator(store, host, Duration::from_secs(5)), sender)
}

#[tokio::test]
async fn get_config_returns_defaults() {
    let service = service(Arc::new(MemoryStore::new()), MemoryPageHost::new(runner()));

    match service.handle(ServiceCommand::GetConfig).await {
        ServiceResponse::Config { config } => {
            assert_eq!(config["targets"], json!(["acceldata"]));
            assert_eq!(config["postsPerTarget"], 3);
            assert_eq!(config["scheduleTime"], "11:00");
            assert_eq!(config["scheduleDays"].as_array().unwrap().len(), 7);
            assert_eq!(config["lastRun"], Value::Null);
            assert_eq!(config["runHistory"], json!([]));
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn update_config_persists_and_reschedules() {
    let store = Arc::new(MemoryStore::new());
    let service = service(Arc::clone(&store), MemoryPageHost::new(runner()));

    let mut config = Map::new();
    config.insert("scheduleDays".into(), json!(["monday", "friday"]));
    config.insert("scheduleTime".into(), json!("09:30"));
    let response = service
        .handle(ServiceCommand::UpdateConfig { config })
        .await;

    assert_eq!(response, ServiceResponse::status(Status::Updated));
    assert_eq!(store.snapshot().await["scheduleTime"], "09:30");
    let names: Vec<String> = service.alarms().await.into_iter().map(|a| a.name).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"postAutomation_monday".to_string()));
    assert!(names.contains(&"postAutomation_friday".to_string()));
}

#[tokio::test]
async fn disabling_auto_process_clears_timers() {
    let service = service(Arc::new(MemoryStore::new()), MemoryPageHost::new(runner()));
    assert_eq!(service.reschedule().await.unwrap(), 7);

    let mut config = Map::new();
    config.insert("autoProcess".into(), json!(false));
    service.handle(ServiceCommand::UpdateConfig { config }).await;

    assert!(service.alarms().await.is_empty());
}

#[tokio::test]
async fn invalid_update_is_rejected_without_writing() {
    let store = Arc::new(MemoryStore::new());
    let service = service(Arc::clone(&store), MemoryPageHost::new(runner()));

    let mut config = Map::new();
    config.insert("scheduleTime".into(), json!("25:99"));
    let response = service
        .handle(ServiceCommand::UpdateConfig { config })
        .await;

    assert!(matches!(
        response,
        ServiceResponse::Error {
            status: Status::Error,
            ..
        }
    ));
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn update_cannot_overwrite_history_or_last_run() {
    let store = store_with(json!({"targets": ["acme"], "postsPerTarget": 1}));
    let service = service(
        Arc::clone(&store),
        MemoryPageHost::new(runner()).with_page(ACME, feed(1)),
    );
    service
        .handle(ServiceCommand::ProcessingComplete {
            results: RunSummary::new(ACME, 1),
        })
        .await;

    let mut config = Map::new();
    config.insert("targets".into(), json!(["acme"]));
    config.insert("runHistory".into(), json!("oops"));
    config.insert("lastRun".into(), json!("not a date"));
    let response = service
        .handle(ServiceCommand::UpdateConfig { config })
        .await;
    assert!(matches!(response, ServiceResponse::Error { .. }));

    assert!(matches!(
        service.handle(ServiceCommand::GetConfig).await,
        ServiceResponse::Config { .. }
    ));
    match service.handle(ServiceCommand::GetHistory).await {
        ServiceResponse::History { history } => assert_eq!(history.len(), 1),
        other => panic!("unexpected response: {:?}", other),
    }

    let report = service
        .orchestrator()
        .run_automation(&configuration(&store).await)
        .await
        .unwrap();
    assert!(report.outcomes[0].error.is_none());
    assert_eq!(
        SettingsStore::new(store).load_history().await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn processing_complete_is_recorded() {
    let service = service(Arc::new(MemoryStore::new()), MemoryPageHost::new(runner()));

    let response = service
        .handle(ServiceCommand::ProcessingComplete {
            results: RunSummary::new(ACME, 3),
        })
        .await;
    assert_eq!(response, ServiceResponse::status(Status::Received));

    match service.handle(ServiceCommand::GetHistory).await {
        ServiceResponse::History { history } => {
            assert_eq!(history.len(), 1);
            assert_eq!(history.latest().unwrap().posts_processed, 3);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn run_command_starts_in_background() {
    let store = store_with(json!({"targets": ["acme"], "postsPerTarget": 1}));
    let service = service(
        Arc::clone(&store),
        MemoryPageHost::new(runner()).with_page(ACME, feed(2)),
    );

    assert_eq!(
        service.handle(ServiceCommand::Run).await,
        ServiceResponse::status(Status::Started)
    );

    // 运行在后台进行，轮询直到历史中出现记录
    let settings = SettingsStore::new(store);
    let mut history = settings.load_history().await.unwrap();
    for _ in 0..100 {
        if !history.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        history = settings.load_history().await.unwrap();
    }
    assert_eq!(history.len(), 1);
    assert_eq!(history.latest().unwrap().posts_processed, 1);
}

#[tokio::test]
async fn scheduled_trigger_runs_automation() {
    let store = store_with(json!({"targets": ["acme"], "postsPerTarget": 2}));
    let service = service(
        Arc::clone(&store),
        MemoryPageHost::new(runner()).with_page(ACME, feed(2)),
    );

    let handle = service
        .spawn_run(Trigger::Scheduled(chrono::Weekday::Mon))
        .await
        .unwrap();
    handle.await.unwrap();

    let history = SettingsStore::new(store).load_history().await.unwrap();
    assert_eq!(history.latest().unwrap().posts_processed, 2);
}

#[tokio::test]
async fn settings_round_trip_through_service() {
    let store = Arc::new(MemoryStore::new());
    let service = service(Arc::clone(&store), MemoryPageHost::new(runner()));

    let mut config = Map::new();
    config.insert("targets".into(), json!(["acme", "in/jane"]));
    config.insert("enableRepost".into(), json!(false));
    service.handle(ServiceCommand::UpdateConfig { config }).await;

    let settings = SettingsStore::new(store).load_settings().await.unwrap();
    assert_eq!(
        settings,
        AutomationSettings {
            targets: vec!["acme".into(), "in/jane".into()],
            enable_repost: false,
            ..AutomationSettings::default()
        }
    );
}
