//! Then steps for hire flow BDD scenarios.

use super::world::{HireFlowWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::then;
use taskmarket::error::ErrorKind;
use taskmarket::payments::domain::Money;
use taskmarket::task::domain::TaskStatus;

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &HireFlowWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = run_async(world.current_task())?;
    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            task.status().as_str()
        ));
    }
    Ok(())
}

#[then("the checkout keeps {dollars:i64} dollars for the platform")]
fn checkout_keeps_platform_fee(world: &HireFlowWorld, dollars: i64) -> Result<(), eyre::Report> {
    let checkout = world
        .checkout
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing checkout"))?;
    let expected = Money::from_units(dollars);
    if checkout.split.platform_fee != expected {
        return Err(eyre::eyre!(
            "expected platform fee {expected}, found {}",
            checkout.split.platform_fee
        ));
    }
    Ok(())
}

#[then("the helper has {count:usize} chat thread")]
fn helper_has_threads(world: &HireFlowWorld, count: usize) -> Result<(), eyre::Report> {
    let threads = run_async(world.wired.market.chat().threads_for(world.helper()?))
        .wrap_err("list helper threads")?;
    if threads.len() != count {
        return Err(eyre::eyre!("expected {count} threads, found {}", threads.len()));
    }
    Ok(())
}

#[then("the helper has {count:u32} completed job")]
fn helper_completed_jobs(world: &HireFlowWorld, count: u32) -> Result<(), eyre::Report> {
    let helper = run_async(world.wired.market.identity().current_user(world.helper()?))
        .wrap_err("load helper")?;
    if helper.completed_jobs_count() != count {
        return Err(eyre::eyre!(
            "expected {count} completed jobs, found {}",
            helper.completed_jobs_count()
        ));
    }
    Ok(())
}

#[then("the action is refused as not permitted")]
fn action_refused(world: &HireFlowWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing action result"))?;
    match result {
        Err(err) if err.kind() == ErrorKind::Authorization => Ok(()),
        other => Err(eyre::eyre!("expected an authorization error, got {other:?}")),
    }
}

#[then("the poster is asked to adjust the price of {count:usize} task")]
fn poster_asked_to_adjust(world: &HireFlowWorld, count: usize) -> Result<(), eyre::Report> {
    let flagged = run_async(
        world
            .wired
            .market
            .tasks()
            .list_needing_price_adjustment(world.poster()?),
    )
    .wrap_err("list tasks needing price adjustment")?;
    if flagged.len() != count {
        return Err(eyre::eyre!(
            "expected {count} flagged tasks, found {}",
            flagged.len()
        ));
    }
    Ok(())
}
