use std::{
    collections::HashSet,
    sync::{
        Arc, OnceLock, Weak,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

use futures::executor::block_on;
use rpc_bridge_core::{
    current::{self, RpcProviderService as _},
    legacy::{self, RpcProviderService as _, RpcService as _},
};
use rpc_bridge_router::{DefaultRpcRouter, LegacyRpcRouter};

use crate::support::{Echo, NativeImplementation, RecordingListener, global, schema_path};

#[test]
fn concurrent_registration_and_close_leave_nothing_behind() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 40;

    let facade = Arc::new(LegacyRpcRouter::new());
    let listener = RecordingListener::accepting();
    let _listening = facade.register_rpc_listener(listener.clone());

    let workers: Vec<_> = (0..THREADS)
        .map(|worker| {
            let facade = Arc::clone(&facade);
            thread::spawn(move || {
                let rpc = format!("/load:worker-{worker}");
                for _ in 0..ROUNDS {
                    let registration =
                        facade.register_rpc_implementations(Echo::new("worker"), &[global(&rpc)]);
                    block_on(facade.invoke_rpc(&schema_path(&rpc), None))
                        .expect("own registration is visible");
                    registration.close();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker thread");
    }

    assert_eq!(facade.mapped_implementations(), 0);
    assert!(listener.visible().is_empty());
    assert!(!listener.events().is_empty());
}

/// 看到 `/native:ping` 可用后，经门面再注册一个实现并立即丢弃句柄。
struct RegisteringListener {
    facade: OnceLock<Weak<LegacyRpcRouter>>,
    fired: AtomicBool,
}

impl legacy::RpcAvailabilityListener for RegisteringListener {
    fn on_rpc_available(&self, rpcs: &[legacy::RpcIdentifier]) {
        if !rpcs.contains(&global("/native:ping")) || self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        // 给另一线程留出进入门面注册的时间。
        thread::sleep(Duration::from_millis(200));
        if let Some(facade) = self.facade.get().and_then(Weak::upgrade) {
            drop(facade.register_rpc_implementations(Echo::new("callback"), &[global("/cb:rpc")]));
        }
    }

    fn on_rpc_unavailable(&self, _rpcs: &[legacy::RpcIdentifier]) {}
}

#[test]
fn listener_callback_may_register_while_another_thread_registers_through_the_facade() {
    let router = DefaultRpcRouter::new();
    let facade = Arc::new(LegacyRpcRouter::with_default_router(router.clone()));
    let registering = Arc::new(RegisteringListener {
        facade: OnceLock::new(),
        fired: AtomicBool::new(false),
    });
    assert!(registering.facade.set(Arc::downgrade(&facade)).is_ok());
    let _registering = facade.register_rpc_listener(Arc::clone(&registering));
    let recording = RecordingListener::accepting();
    let _recording = facade.register_rpc_listener(recording.clone());

    let (native_done, native_handle) = mpsc::channel();
    let native_router = router.clone();
    thread::spawn(move || {
        let rpcs: HashSet<_> = [current::RpcIdentifier::global(schema_path("/native:ping"))]
            .into_iter()
            .collect();
        let registration =
            native_router.register_rpc_implementation(Arc::new(NativeImplementation), rpcs);
        let _ = native_done.send(registration);
    });

    let (facade_done, facade_handle) = mpsc::channel();
    let racing = Arc::clone(&facade);
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let registration =
            racing.register_rpc_implementations(Echo::new("racing"), &[global("/a:rpc")]);
        let _ = facade_done.send(registration);
    });

    let _native = native_handle
        .recv_timeout(Duration::from_secs(5))
        .expect("native registration completes");
    let _racing = facade_handle
        .recv_timeout(Duration::from_secs(5))
        .expect("facade registration completes");

    assert!(registering.fired.load(Ordering::SeqCst));
    let visible = recording.visible();
    assert!(visible.contains(&global("/native:ping")));
    assert!(visible.contains(&global("/a:rpc")));
    assert!(!visible.contains(&global("/cb:rpc")));
    assert_eq!(facade.mapped_implementations(), 1);
}
