//! Two components share a counter while a third derives its parity.
//!
//! Run with `RUST_LOG=tincan_global=trace` to watch every notification.

use tincan_global::{use_global_selector, use_global_state, GlobalStore, StoreError, Values};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn rerender(component: &'static str) -> impl Fn() + Send + Sync + 'static {
    move || info!(component, "re-render requested")
}

fn main() -> Result<(), StoreError> {
    init_tracing();

    let store = GlobalStore::new();

    let (header, set_count) = use_global_state(&store, "count", 0u32, rerender("header"))?;
    let (footer, _) = use_global_state(&store, "count", 0u32, rerender("footer"))?;
    let parity = use_global_selector(
        &store,
        |values: &Values| values.get_as::<u32>("count").is_some_and(|n| *n % 2 == 0),
        rerender("parity"),
    );

    let set_from_button = set_count.clone();
    let click = move || set_from_button.set_with(|n| n + 1);

    for _ in 0..3 {
        click();
        info!(
            header = *header.get()?,
            footer = *footer.get()?,
            even = parity.get(),
            "rendered"
        );
    }

    // Same value again: storage updates, nobody re-renders.
    let current = *header.get()?;
    set_count.set(current);

    info!(listeners = store.listener_count(), "done");
    Ok(())
}
