//! Service calls end to end against local HTTP instances

mod common;

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use cuttle_sdk::config::{AuthConfig, Config, DiscoveryConfig};
use cuttle_sdk::services::{
    Datastore, Notification, NotificationEvent, datastores, octopus, websockets,
};
use cuttle_sdk::{Error, SdkClient};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use common::{Hits, closed_addr, fast_retry, http_invoker, instance, spawn};

fn failing_router(hits: &Hits, path: &str) -> Router {
    let hits = hits.clone();
    Router::new().route(
        path,
        get(move || {
            let hits = hits.clone();
            async move {
                hits.hit();
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }),
    )
}

fn datastore_list_router(hits: &Hits) -> Router {
    let hits = hits.clone();
    Router::new().route(
        "/services/datastore/list",
        get(move || {
            let hits = hits.clone();
            async move {
                hits.hit();
                Json(json!({"Message": "ok", "Data": [{"ID": 1, "Name": "ds1"}]}))
            }
        }),
    )
}

#[tokio::test]
async fn test_list_fails_over_to_second_instance() {
    let (a_hits, b_hits) = (Hits::default(), Hits::default());
    let a = spawn(failing_router(&a_hits, "/services/datastore/list")).await;
    let b = spawn(datastore_list_router(&b_hits)).await;

    let invoker = http_invoker(
        vec![
            instance(datastores::SERVICE, a),
            instance(datastores::SERVICE, b),
        ],
        "tok",
    );
    let list = datastores::list_datastores(&invoker).await.unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, 1);
    assert_eq!(list[0].name, "ds1");
    // A spent its whole retry budget before B was tried
    assert_eq!(a_hits.count(), 4);
    assert_eq!(b_hits.count(), 1);
}

#[tokio::test]
async fn test_flaky_single_instance_recovers() {
    let hits = Hits::default();
    let router = Router::new().route(
        "/services/datastore/list",
        get({
            let hits = hits.clone();
            move || {
                let hits = hits.clone();
                async move {
                    if hits.hit() < 2 {
                        (StatusCode::BAD_GATEWAY, Json(json!({})))
                    } else {
                        (StatusCode::OK, Json(json!({"Message": "ok", "Data": []})))
                    }
                }
            }
        }),
    );
    let addr = spawn(router).await;

    let invoker = http_invoker(vec![instance(datastores::SERVICE, addr)], "tok");
    let list = datastores::list_datastores(&invoker).await.unwrap();

    assert!(list.is_empty());
    assert_eq!(hits.count(), 3);
}

#[tokio::test]
async fn test_get_datastore_posts_id_with_token() {
    let seen: Arc<Mutex<Option<(Option<String>, Value)>>> = Arc::default();
    let router = Router::new().route(
        "/services/datastore/get",
        post({
            let seen = seen.clone();
            move |headers: HeaderMap, Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    let token = headers
                        .get("auth-token")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    *seen.lock().unwrap() = Some((token, body));
                    Json(json!({
                        "Message": "found",
                        "Data": {
                            "ID": 7,
                            "Name": "sales",
                            "URL": "db.local",
                            "Port": 5432,
                            "Datastore": "postgres"
                        }
                    }))
                }
            }
        }),
    );
    let addr = spawn(router).await;

    let invoker = http_invoker(vec![instance(datastores::SERVICE, addr)], "app-token");
    let datastore = datastores::get_datastore(&invoker, 7).await.unwrap().unwrap();

    assert_eq!(datastore.id, 7);
    assert_eq!(datastore.port, 5432);
    assert_eq!(datastore.datastore, "postgres");

    let (token, body) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(token.as_deref(), Some("app-token"));
    assert_eq!(body["ID"], 7);
}

#[tokio::test]
async fn test_create_datastore_round_trip() {
    let router = Router::new().route(
        "/services/datastore/create",
        post(|Json(mut body): Json<Value>| async move {
            body["ID"] = json!(42);
            Json(json!({"Message": "created", "Data": body}))
        }),
    );
    let addr = spawn(router).await;

    let invoker = http_invoker(vec![instance(datastores::SERVICE, addr)], "tok");
    let record = Datastore {
        name: "analytics".to_string(),
        url: "warehouse.local".to_string(),
        port: 5439,
        username: "etl".to_string(),
        password: "secret".to_string(),
        datastore: "redshift".to_string(),
        ..Default::default()
    };
    let created = datastores::create_datastore(&invoker, &record)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        created,
        Datastore {
            id: 42,
            ..record
        }
    );
}

#[tokio::test]
async fn test_remove_dict_reaches_every_instance() {
    let hits: Vec<Hits> = (0..3).map(|_| Hits::default()).collect();
    let mut instances = Vec::new();
    for h in &hits {
        let h = h.clone();
        let router = Router::new().route(
            "/dict/remove",
            get(move || {
                let h = h.clone();
                async move {
                    h.hit();
                    Json(json!({"Message": "removed", "Data": null}))
                }
            }),
        );
        instances.push(instance(octopus::SERVICE, spawn(router).await));
    }

    let invoker = http_invoker(instances, "tok");
    let report = octopus::remove_dict(&invoker).await.unwrap();

    assert_eq!(report.delivered.len(), 3);
    assert!(report.failures.is_empty());
    assert!(hits.iter().all(|h| h.count() == 1));
}

#[tokio::test]
async fn test_update_dict_partial_delivery() {
    let up_hits = Hits::default();
    let up = spawn(
        Router::new().route(
            "/dict/update",
            get({
                let h = up_hits.clone();
                move || {
                    let h = h.clone();
                    async move {
                        h.hit();
                        Json(json!({"Message": "updated"}))
                    }
                }
            }),
        ),
    )
    .await;
    let down = closed_addr().await;

    let invoker = http_invoker(
        vec![instance(octopus::SERVICE, down), instance(octopus::SERVICE, up)],
        "tok",
    );
    let report = octopus::update_dict(&invoker).await.unwrap();

    assert_eq!(report.attempted(), 2);
    assert_eq!(report.delivered.len(), 1);
    assert_eq!(report.delivered[0].1.message, "updated");
    assert_eq!(up_hits.count(), 1);
}

#[tokio::test]
async fn test_send_info_notification_forces_info() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::default();
    let router = Router::new().route(
        "/notifications/send",
        post({
            let seen = seen.clone();
            move |Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(json!({"Message": "sent", "Data": null}))
                }
            }
        }),
    );
    let addr = spawn(router).await;

    let invoker = http_invoker(vec![instance(websockets::SERVICE, addr)], "tok");
    websockets::send_info_notification(
        &invoker,
        Notification::new(NotificationEvent::Error, json!({"job": 3})),
    )
    .await
    .unwrap();

    assert_eq!(
        seen.lock().unwrap().clone().unwrap(),
        json!({"Event": "info", "Payload": {"job": 3}})
    );
}

#[tokio::test]
async fn test_no_instances_is_an_error() {
    let invoker = http_invoker(Vec::new(), "tok");
    let result = datastores::list_datastores(&invoker).await;

    assert!(matches!(result, Err(Error::NoInstances(ref s)) if s == datastores::SERVICE));
}

#[tokio::test]
async fn test_all_instances_failed_is_an_error() {
    let hits = Hits::default();
    let a = spawn(failing_router(&hits, "/services/datastore/list")).await;
    let b = closed_addr().await;

    let invoker = http_invoker(
        vec![
            instance(datastores::SERVICE, a),
            instance(datastores::SERVICE, b),
        ],
        "tok",
    );
    let result = datastores::list_datastores(&invoker).await;

    assert!(matches!(
        result,
        Err(Error::AllInstancesFailed { attempts: 2, .. })
    ));
}

#[tokio::test]
async fn test_client_from_config_through_consul() {
    let list_hits = Hits::default();
    let instance_addr = spawn(datastore_list_router(&list_hits)).await;

    let services = json!({
        (datastores::SERVICE): {
            "ID": datastores::SERVICE,
            "Service": "data-integration",
            "Address": instance_addr.ip().to_string(),
            "Port": instance_addr.port()
        }
    });
    let consul = spawn(Router::new().route(
        "/v1/agent/services",
        get(move || {
            let services = services.clone();
            async move { Json(services) }
        }),
    ))
    .await;

    let config = Config {
        discovery: DiscoveryConfig {
            address: consul.to_string(),
            ..Default::default()
        },
        auth: AuthConfig {
            access_token: "tok".to_string(),
            ..Default::default()
        },
        retry: fast_retry(),
        ..Default::default()
    };
    let client = SdkClient::from_config(&config).unwrap();

    let instances = client.instances(datastores::SERVICE).await.unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].port, instance_addr.port());

    let list = client.list_datastores().await.unwrap();
    assert_eq!(list[0].name, "ds1");
    assert_eq!(list_hits.count(), 1);
}
