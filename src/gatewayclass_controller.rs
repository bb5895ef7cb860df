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
use gateway_api::apis::standard::gatewayclasses::GatewayClass;
use kube::{
    api::{Api, ListParams},
    runtime::{controller::Action, watcher::Config, Controller},
    Resource, ResourceExt,
};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::Context;

/// `UpsertGatewayClass`/`DeleteGatewayClass` (spec.md §4.7, §9) wired to the
/// shared `ReconcileManager`'s class cache.
async fn reconcile(class: Arc<GatewayClass>, ctx: Arc<Context>) -> Result<Action> {
    let name = class.name_any();

    if class.meta().deletion_timestamp.is_some() {
        ctx.manager.delete_gateway_class(&name);
        info!(%name, "removed gateway class from cache");
        return Ok(Action::await_change());
    }

    let accepted = ctx.manager.upsert_gateway_class(&class);
    info!(%name, accepted, "reconciled gateway class");
    Ok(Action::await_change())
}

fn error_policy(_: Arc<GatewayClass>, error: &Error, _: Arc<Context>) -> Action {
    warn!("reconcile failed: {:?}", error);
    Action::requeue(Duration::from_secs(5))
}

pub async fn gatewayclass_controller(ctx: Context) -> Result<()> {
    let api = Api::<GatewayClass>::all(ctx.client.clone());
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
