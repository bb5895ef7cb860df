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
use gateway_api::apis::standard::gateways::Gateway;
use kube::{
    api::{Api, ListParams},
    runtime::{controller::Action, watcher::Config, Controller},
    Resource, ResourceExt,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::ids::GatewayId;
use crate::Context;

/// Each managed gateway gets its own downstream namespace so its mirrored
/// workload (ServiceAccount/Secret/Deployment/Service, spec.md §4.5) never
/// collides with another gateway's.
fn downstream_namespace_for(namespace: &str, name: &str) -> String {
    format!("mesh-{namespace}-{name}")
}

async fn reconcile(gateway: Arc<Gateway>, ctx: Arc<Context>) -> Result<Action> {
    let name = gateway.name_any();
    let namespace = gateway.namespace().ok_or(Error::MissingNamespace)?;

    let cancel = CancellationToken::new();

    if gateway.meta().deletion_timestamp.is_some() {
        debug!(%namespace, %name, "gateway deleted; removing from cache");
        ctx.manager
            .delete_gateway(&GatewayId::new(namespace.clone(), name.clone()), &cancel)
            .await?;
        return Ok(Action::await_change());
    }

    let downstream_namespace = downstream_namespace_for(&namespace, &name);
    match ctx
        .manager
        .upsert_gateway(&gateway, &downstream_namespace, &cancel)
        .await?
    {
        Some(_) => info!(%namespace, %name, "reconciled gateway"),
        None => debug!(%namespace, %name, "gateway not managed by our GatewayClass"),
    }
    Ok(Action::await_change())
}

fn error_policy(_: Arc<Gateway>, error: &Error, _: Arc<Context>) -> Action {
    warn!("reconcile failed: {:?}", error);
    Action::requeue(Duration::from_secs(5))
}

pub async fn gateway_controller(ctx: Context) -> Result<()> {
    let api = Api::<Gateway>::all(ctx.client.clone());
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
