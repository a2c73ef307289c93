//! 路由表快照：按 RPC 类型聚合实现，并预先排好挑选顺序。
//!
//! 快照只在写路径上整表重建，读路径通过 `ArcSwap::load` 拿到不可变视图后顺序查找。

use std::{collections::HashMap, sync::Arc};

use rpc_bridge_core::{
    InstancePath, SchemaPath,
    current::{RpcIdentifier, RpcImplementation},
};

/// 路由器内部的一条实现注册。
///
/// `cost` 在注册时读取一次；实现之后改变成本不会影响既有排序。
pub(crate) struct ImplementationEntry {
    pub(crate) registration: u64,
    pub(crate) cost: u64,
    pub(crate) implementation: Arc<dyn RpcImplementation>,
    pub(crate) rpcs: Vec<RpcIdentifier>,
}

/// 某个 RPC 的一个候选实现。
#[derive(Clone)]
pub(crate) struct Candidate {
    pub(crate) registration: u64,
    pub(crate) cost: u64,
    pub(crate) implementation: Arc<dyn RpcImplementation>,
}

impl Candidate {
    fn order_key(&self) -> (u64, u64) {
        (self.cost, self.registration)
    }
}

/// 单个 RPC 类型下的候选集合。
#[derive(Default)]
pub(crate) struct RpcEntry {
    global: Vec<Candidate>,
    routed: HashMap<InstancePath, Vec<Candidate>>,
}

impl RpcEntry {
    /// 成本最低的全局实现。
    pub(crate) fn global(&self) -> Option<&Candidate> {
        self.global.first()
    }

    /// 精确匹配上下文的实现。
    pub(crate) fn routed(&self, context: &InstancePath) -> Option<&Candidate> {
        self.routed.get(context).and_then(|candidates| candidates.first())
    }

    fn sort(&mut self) {
        self.global.sort_by_key(Candidate::order_key);
        for candidates in self.routed.values_mut() {
            candidates.sort_by_key(Candidate::order_key);
        }
    }
}

/// 不可变的路由表快照。
#[derive(Default)]
pub(crate) struct RoutingTable {
    entries: HashMap<SchemaPath, RpcEntry>,
}

impl RoutingTable {
    /// 由当前全部注册重建快照。
    ///
    /// 同一实现对同一标识符重复声明时只计一次。
    pub(crate) fn build<'a>(registrations: impl IntoIterator<Item = &'a ImplementationEntry>) -> Self {
        let mut entries: HashMap<SchemaPath, RpcEntry> = HashMap::new();
        for registration in registrations {
            for rpc in &registration.rpcs {
                let candidate = Candidate {
                    registration: registration.registration,
                    cost: registration.cost,
                    implementation: Arc::clone(&registration.implementation),
                };
                let entry = entries.entry(rpc.rpc_type().clone()).or_default();
                let bucket = match rpc.context() {
                    None => &mut entry.global,
                    Some(context) => entry.routed.entry(context.clone()).or_default(),
                };
                if !bucket
                    .iter()
                    .any(|existing| existing.registration == candidate.registration)
                {
                    bucket.push(candidate);
                }
            }
        }
        for entry in entries.values_mut() {
            entry.sort();
        }
        Self { entries }
    }

    pub(crate) fn entry(&self, rpc_type: &SchemaPath) -> Option<&RpcEntry> {
        self.entries.get(rpc_type)
    }

    /// 标识符当前是否至少有一个实现。
    pub(crate) fn is_available(&self, rpc: &RpcIdentifier) -> bool {
        self.entries.get(rpc.rpc_type()).is_some_and(|entry| match rpc.context() {
            None => entry.global().is_some(),
            Some(context) => entry.routed(context).is_some(),
        })
    }

    /// 当前可用的全部标识符，顺序不作保证。
    pub(crate) fn available(&self) -> Vec<RpcIdentifier> {
        let mut rpcs = Vec::new();
        for (rpc_type, entry) in &self.entries {
            if !entry.global.is_empty() {
                rpcs.push(RpcIdentifier::global(rpc_type.clone()));
            }
            for context in entry.routed.keys() {
                rpcs.push(RpcIdentifier::create(rpc_type.clone(), Some(context.clone())));
            }
        }
        rpcs
    }
}
