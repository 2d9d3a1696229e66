use actix::prelude::*;
use anyhow::Context as _;
use crossterm::{
    cursor, execute, terminal,
    event::{self, Event, KeyCode},
};
use log::LevelFilter;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lanzou_transfer::cli::{self, Command};
use lanzou_transfer::core::queue::{CancelTask, ListTasks, PauseAll, ResumeAll};
use lanzou_transfer::core::task::{Category, NoRemoteFiles, Task, TaskExecutor};
use lanzou_transfer::core::TransferManager;
use lanzou_transfer::downloader::HttpTransfer;
use lanzou_transfer::ui::{self, ProgressManager, TransferSummary};
use lanzou_transfer::utils::logger::{LoggerActor, LoggerExt};

const PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_millis(200);
const KEYBOARD_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[actix::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let (args, config) = cli::Args::parse_args().context("参数解析失败")?;
    if args.build_info {
        println!("lzt {} (built {})", env!("CARGO_PKG_VERSION"), env!("VERGEN_BUILD_TIMESTAMP"));
        return Ok(());
    }

    let log_path = Path::new(&config.state_dir).join("logs").join("lzt.log");
    let logger = LoggerActor::new(&log_path.to_string_lossy(), LevelFilter::Info, 10 * 1024 * 1024)
        .context("无法创建日志文件")?
        .start();
    logger.info("程序启动");
    logger.info(&format!("配置文件路径: {}", args.config));
    log::debug!("{}", config.get_summary());

    let executor = TaskExecutor::new(Arc::new(HttpTransfer::new(&config)), Arc::new(NoRemoteFiles));
    let manager = TransferManager::start(&config, executor);
    manager.subscribe(logger.clone().recipient());

    let download_dir = Path::new(&config.download_dir);
    match args.command.clone().unwrap_or(Command::List) {
        command @ Command::Add { .. } => {
            let tasks = cli::share_tasks(&command, download_dir)?;
            enqueue(&manager, tasks, &logger).await?;
            run_transfer_loop(&manager, &logger).await?;
        }
        Command::Fetch { urls, name } => {
            let tasks = cli::link_tasks(&urls, name.as_deref(), download_dir)?;
            enqueue(&manager, tasks, &logger).await?;
            run_transfer_loop(&manager, &logger).await?;
        }
        Command::Resume => {
            let mut resumed = 0;
            for category in Category::ALL {
                resumed += manager.queue(category).send(ResumeAll).await?;
            }
            println!("继续 {} 个任务", resumed);
            run_transfer_loop(&manager, &logger).await?;
        }
        Command::List => {
            for category in Category::ALL {
                let tasks = manager.queue(category).send(ListTasks).await?;
                ui::print_tasks(category, &tasks);
            }
        }
        Command::Finished { category } => {
            let categories = match category {
                Some(category) => vec![category],
                None => Category::ALL.to_vec(),
            };
            for category in categories {
                let entries = manager.completed(category).await?;
                ui::print_completed(category, &entries);
            }
        }
        Command::ClearFinished { category } => {
            let cleared = manager.clear_completed(category).await?;
            ui::print_success(&format!("已清空 {} 完成列表 {} 条", category, cleared));
            logger.info(&format!("清空 {} 完成列表 {} 条", category, cleared));
        }
    }

    Ok(())
}

async fn enqueue(manager: &TransferManager, tasks: Vec<Task>, logger: &Addr<LoggerActor>) -> anyhow::Result<()> {
    for task in &tasks {
        ui::print_success(&format!("添加{}任务: {}", task.category(), task.name()));
    }
    let accepted = manager.add_tasks(tasks).await?;
    logger.info(&format!("添加 {} 个任务", accepted));
    Ok(())
}

async fn snapshot(manager: &TransferManager) -> anyhow::Result<Vec<Task>> {
    let mut all = Vec::new();
    for category in Category::ALL {
        all.extend(manager.queue(category).send(ListTasks).await?);
    }
    Ok(all)
}

/// 运行传输主循环：处理键盘输入、刷新进度，所有队列空闲后退出
async fn run_transfer_loop(manager: &TransferManager, logger: &Addr<LoggerActor>) -> anyhow::Result<()> {
    let started = Instant::now();
    let started_utc = chrono::Utc::now();
    let mut last_update = Instant::now();
    let mut paused_by_user = false;
    let mut progress = ProgressManager::new();

    println!("\n开始传输... (按 'p' 暂停, 'r' 继续, 'c' 取消, 'q' 退出)");

    terminal::enable_raw_mode()?;
    execute!(std::io::stdout(), cursor::Hide)?;

    let outcome: anyhow::Result<()> = async {
        loop {
            if let Ok(true) = event::poll(KEYBOARD_POLL_INTERVAL) {
                if let Ok(Event::Key(key_event)) = event::read() {
                    match key_event.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => {
                            // 运行中的任务下次启动时以暂停状态恢复
                            logger.info("用户主动退出");
                            break;
                        }
                        KeyCode::Char('p') | KeyCode::Char('P') => {
                            for category in Category::ALL {
                                manager.queue(category).send(PauseAll).await?;
                            }
                            paused_by_user = true;
                            logger.info("用户暂停所有任务");
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            for category in Category::ALL {
                                manager.queue(category).send(ResumeAll).await?;
                            }
                            paused_by_user = false;
                            logger.info("用户继续所有任务");
                        }
                        KeyCode::Char('c') | KeyCode::Char('C') => {
                            for task in snapshot(manager).await? {
                                manager.queue(task.category()).do_send(CancelTask(task.id));
                            }
                            paused_by_user = false;
                            logger.info("用户取消所有任务");
                        }
                        _ => {}
                    }
                }
            }

            if last_update.elapsed() >= PROGRESS_UPDATE_INTERVAL {
                let tasks = snapshot(manager).await?;
                progress.update(&tasks);

                let stats = manager.stats().await?;
                let active: usize = stats.iter().map(|(_, s)| s.pending + s.running).sum();
                if active == 0 && !paused_by_user {
                    break;
                }
                last_update = Instant::now();
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
    .await;

    execute!(std::io::stdout(), cursor::Show)?;
    terminal::disable_raw_mode()?;
    progress.finish();
    outcome?;

    let summary = TransferSummary { stats: manager.stats().await?, elapsed_time: started.elapsed() };
    println!("{}", summary);
    for category in Category::ALL {
        let failed: Vec<_> = manager
            .completed(category)
            .await?
            .into_iter()
            .filter(|entry| entry.task.error.is_some() && entry.finished_at >= started_utc)
            .collect();
        for entry in failed {
            ui::print_error(&format!("{}: {}", entry.task.name(), entry.task.error.as_deref().unwrap_or_default()));
        }
    }
    Ok(())
}
