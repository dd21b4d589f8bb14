//! When steps for hire flow BDD scenarios.

use super::world::{HireFlowWorld, run_async};
use chrono::Duration;
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when("the poster chooses the helper")]
fn poster_chooses_helper(world: &mut HireFlowWorld) -> Result<(), eyre::Report> {
    run_async(world.choose_helper())
}

#[when("the processor confirms the checkout")]
fn processor_confirms(world: &mut HireFlowWorld) -> Result<(), eyre::Report> {
    run_async(world.confirm_checkout())
}

#[when("the helper starts work")]
fn helper_starts(world: &mut HireFlowWorld) -> Result<(), eyre::Report> {
    let (helper, task) = (world.helper()?, world.task()?);
    run_async(world.wired.market.tasks().start_work(helper, task)).wrap_err("start work")?;
    Ok(())
}

#[when("the helper marks the work done")]
fn helper_marks_done(world: &mut HireFlowWorld) -> Result<(), eyre::Report> {
    let (helper, task) = (world.helper()?, world.task()?);
    run_async(world.wired.market.tasks().mark_done(helper, task)).wrap_err("mark done")?;
    Ok(())
}

#[when("the poster approves the work")]
fn poster_approves(world: &mut HireFlowWorld) -> Result<(), eyre::Report> {
    let (poster, task) = (world.poster()?, world.task()?);
    run_async(world.wired.market.tasks().complete(poster, task)).wrap_err("complete task")?;
    Ok(())
}

#[when("the poster tries to start work")]
fn poster_tries_to_start(world: &mut HireFlowWorld) -> Result<(), eyre::Report> {
    let (poster, task) = (world.poster()?, world.task()?);
    let result = run_async(world.wired.market.tasks().start_work(poster, task));
    world.last_result = Some(result);
    Ok(())
}

#[when("{hours:i64} hours pass and the price sweep runs")]
fn hours_pass_and_sweep_runs(world: &mut HireFlowWorld, hours: i64) -> Result<(), eyre::Report> {
    world.wired.clock.advance(Duration::hours(hours));
    run_async(world.wired.market.sweep().run()).wrap_err("run price sweep")?;
    Ok(())
}
