use std::path::Path;

use notify::{Config as NotifyConfig, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::app_context::AppContext;
use crate::config::{RuntimeConfig, load_config};

async fn apply_runtime_reload_from_path(
    app_context: &AppContext,
    config_path: &str,
) -> Result<RuntimeConfig, String> {
    let new_config = load_config(config_path).map_err(|error| error.to_string())?;
    let runtime_config = RuntimeConfig::from_config(&new_config);
    app_context.update_runtime_config(runtime_config.clone()).await;
    Ok(runtime_config)
}

pub(super) fn start_config_hot_reload_job(app_context: AppContext) {
    tokio::spawn(async move {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let config_path = app_context.config_path.clone();
        let mut watcher = match RecommendedWatcher::new(
            move |result| {
                let _ = tx.send(result);
            },
            NotifyConfig::default(),
        ) {
            Ok(watcher) => watcher,
            Err(error) => {
                log::warn!("config hot-reload disabled: watcher init failed: {}", error);
                return;
            }
        };

        if let Err(error) =
            watcher.watch(Path::new(config_path.as_str()), RecursiveMode::NonRecursive)
        {
            log::warn!(
                "config hot-reload disabled: failed to watch {}: {}",
                config_path,
                error
            );
            return;
        }

        while let Some(event_result) = rx.recv().await {
            let event = match event_result {
                Ok(event) => event,
                Err(error) => {
                    log::warn!("config hot-reload event error: {}", error);
                    continue;
                }
            };

            let should_reload = matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
            );
            if !should_reload {
                continue;
            }

            match apply_runtime_reload_from_path(&app_context, config_path.as_str()).await {
                Ok(runtime_config) => {
                    log::info!(
                        "config_hot_reload_applied target=runtime poll_interval_secs={} probe_timeout_secs={} worker_limit={} dedup_window_hours={} consumable_warning={:?} consumable_critical={:?}",
                        runtime_config.poll_interval_secs,
                        runtime_config.probe_timeout_secs,
                        runtime_config.worker_limit,
                        runtime_config.dedup_window_hours,
                        runtime_config.consumables.warning_level,
                        runtime_config.consumables.critical_level,
                    );
                }
                Err(error) => {
                    log::warn!("config hot-reload ignored invalid config: {}", error);
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::app_context::AppContext;
    use crate::config::Config;

    use super::apply_runtime_reload_from_path;

    fn context() -> AppContext {
        let config: Config = toml::from_str("").expect("default config");
        AppContext::new(config, "unused.toml")
    }

    #[tokio::test]
    async fn valid_file_updates_the_runtime_config() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[monitor]\npoll_interval_secs = 30\nworker_limit = 4").expect("write");

        let app_context = context();
        let path = file.path().to_string_lossy().to_string();
        let applied = apply_runtime_reload_from_path(&app_context, &path)
            .await
            .expect("reload");

        assert_eq!(applied.poll_interval_secs, 30);
        assert_eq!(applied.worker_limit, 4);
        let runtime = app_context.runtime_config.read().await;
        assert_eq!(runtime.poll_interval_secs, 30);
    }

    #[tokio::test]
    async fn invalid_file_leaves_the_runtime_config_untouched() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[monitor]\nworker_limit = 0").expect("write");

        let app_context = context();
        let before = app_context.runtime_config.read().await.clone();
        let path = file.path().to_string_lossy().to_string();
        let result = apply_runtime_reload_from_path(&app_context, &path).await;

        assert!(result.is_err());
        let after = app_context.runtime_config.read().await;
        assert_eq!(after.worker_limit, before.worker_limit);
    }

    #[tokio::test]
    async fn reload_wakes_runtime_update_waiters() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[monitor]\npoll_interval_secs = 15").expect("write");

        let app_context = context();
        let notify = app_context.runtime_update_notify.clone();
        let notified = notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let path = file.path().to_string_lossy().to_string();
        apply_runtime_reload_from_path(&app_context, &path)
            .await
            .expect("reload");

        tokio::time::timeout(std::time::Duration::from_secs(1), notified)
            .await
            .expect("waiter should be woken");
    }
}
