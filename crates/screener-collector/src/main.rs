//! Standalone daily update CLI.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use screener_collector::{modules, CollectorConfig};
use screener_data::{Database, DatabaseConfig, YahooProvider};
use screener_notification::{format_job_report, JobResult, TelegramSender};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "screener-collector")]
#[command(about = "Stock Screener Daily Update Pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 일일 가격 갱신 (유니버스 → 분류 → 신규/재적재/증분 저장)
    DailyUpdate {
        /// 처리할 심볼 수 제한 (테스트용)
        #[arg(long)]
        limit: Option<usize>,

        /// 증분 갱신 조회 구간 (거래일)
        #[arg(long)]
        lookback_days: Option<u32>,
    },

    /// 기술 지표 계산 (상대강도, 범위 지표)
    CalcIndicators {
        /// 계산 기준일 (YYYY-MM-DD, 기본: 오늘)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// 전체 워크플로우 실행 (가격 갱신 → 지표 계산), 결과 텔레그램 보고
    RunAll,
}

fn build_provider(config: &CollectorConfig) -> screener_data::Result<YahooProvider> {
    Ok(YahooProvider::new()?
        .with_chunk_size(config.daily_update.chunk_size)
        .with_chunk_delay(config.daily_update.chunk_delay()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("screener_collector={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Screener Collector 시작");

    // 설정 로드
    let mut config = CollectorConfig::from_env()?;
    tracing::debug!(chunk_size = config.daily_update.chunk_size, "설정 로드 완료");

    // 종료 토큰: ctrl-c 수신 시 파이프라인이 청크/배치 경계에서
    // 풀을 닫고 중단하도록 전파한다
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("종료 신호 수신, 현재 단계를 마친 뒤 중단합니다");
            signal_token.cancel();
        }
    });

    // 명령 실행
    match cli.command {
        Commands::DailyUpdate {
            limit,
            lookback_days,
        } => {
            if limit.is_some() {
                config.daily_update.symbol_limit = limit;
            }
            if let Some(days) = lookback_days {
                config.daily_update.lookback_days = days;
            }

            let provider = build_provider(&config)?;
            modules::daily_update(&provider, &config, &shutdown).await?;
        }
        Commands::CalcIndicators { date } => {
            let calc_date = date.unwrap_or_else(|| Utc::now().date_naive());
            let db = Database::connect(&DatabaseConfig::new(&config.database_url)).await?;
            let stats = modules::refresh_indicators(&db, &config.indicators, calc_date).await?;
            stats.log_summary();
            db.close().await;
        }
        Commands::RunAll => {
            tracing::info!("=== 전체 워크플로우 시작 ===");
            let overall_start = Instant::now();
            let mut results: Vec<JobResult> = Vec::new();

            // 1. 일일 가격 갱신
            tracing::info!("Step 1/2: 일일 가격 갱신");
            let step_start = Instant::now();
            let provider = build_provider(&config)?;
            let update_outcome = modules::daily_update(&provider, &config, &shutdown).await;
            let step_elapsed = step_start.elapsed().as_secs_f64();

            match &update_outcome {
                Ok(_) => results.push(JobResult::success("daily-update", step_elapsed)),
                Err(e) => {
                    tracing::error!("일일 가격 갱신 실패: {}", e);
                    results.push(JobResult::failure("daily-update", step_elapsed, e.to_string()));
                }
            }

            // 2. 지표 계산 (가격 갱신이 성공했을 때만)
            if update_outcome.is_ok() {
                tracing::info!("Step 2/2: 지표 계산");
                let step_start = Instant::now();
                let calc_date = Utc::now().date_naive();
                let db = Database::connect(&DatabaseConfig::new(&config.database_url)).await?;
                let indicator_outcome =
                    modules::refresh_indicators(&db, &config.indicators, calc_date).await;
                db.close().await;
                let step_elapsed = step_start.elapsed().as_secs_f64();

                match &indicator_outcome {
                    Ok(stats) => {
                        stats.log_summary();
                        results.push(JobResult::success("calc-indicators", step_elapsed));
                    }
                    Err(e) => {
                        tracing::error!("지표 계산 실패: {}", e);
                        results.push(JobResult::failure(
                            "calc-indicators",
                            step_elapsed,
                            e.to_string(),
                        ));
                    }
                }
            } else {
                tracing::warn!("가격 갱신 실패로 지표 계산을 건너뜁니다");
            }

            // 결과 보고
            let message = format_job_report(&results, overall_start.elapsed().as_secs_f64());
            if let Some(sender) = TelegramSender::from_env() {
                if let Err(e) = sender.send(&message).await {
                    tracing::warn!("텔레그램 보고 전송 실패: {}", e);
                }
            } else {
                tracing::debug!("텔레그램 설정 없음, 보고 생략");
            }

            if results.iter().any(|r| !r.success) {
                tracing::error!("=== 전체 워크플로우 실패 ===");
                return Err("workflow failed".into());
            }
            tracing::info!("=== 전체 워크플로우 완료 ===");
        }
    }

    tracing::info!("Screener Collector 종료");
    Ok(())
}
