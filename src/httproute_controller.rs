/*
Copyright 2024 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use gateway_api::apis::standard::httproutes::HTTPRoute;
use kube::{
    api::{Api, ListParams},
    runtime::{controller::Action, watcher::Config, Controller},
    Resource, ResourceExt,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::ids::{RouteId, RouteKind};
use crate::Context;

async fn reconcile(route: Arc<HTTPRoute>, ctx: Arc<Context>) -> Result<Action> {
    let name = route.name_any();
    let namespace = route.namespace().ok_or(Error::MissingNamespace)?;

    let cancel = CancellationToken::new();

    if route.meta().deletion_timestamp.is_some() {
        debug!(%namespace, %name, "http route deleted; removing from store");
        ctx.manager
            .delete_route(
                &RouteId::new(RouteKind::Http, namespace.clone(), name.clone()),
                &cancel,
            )
            .await?;
        return Ok(Action::await_change());
    }

    match ctx.manager.upsert_http_route(&route, &cancel).await? {
        Some(_) => info!(%namespace, %name, "reconciled http route"),
        None => debug!(%namespace, %name, "http route targets no managed gateway"),
    }
    Ok(Action::await_change())
}

fn error_policy(_: Arc<HTTPRoute>, error: &Error, _: Arc<Context>) -> Action {
    warn!("reconcile failed: {:?}", error);
    Action::requeue(Duration::from_secs(5))
}

pub async fn http_route_controller(ctx: Context) -> Result<()> {
    let api = Api::<HTTPRoute>::all(ctx.client.clone());
    api.list(&ListParams::default().limit(1))
        .await
        .map_err(Error::CrdNotFound)?;

    Controller::new(api, Config::default().any_semantic())
        .shutdown_on_signal()
        .run(reconcile, error_policy, Arc::new(ctx))
        .filter_map(|x| async move { std::result::Result::ok(x) })
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}
