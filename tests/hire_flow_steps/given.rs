//! Given steps for hire flow BDD scenarios.

use super::world::{HireFlowWorld, run_async};
use rstest_bdd_macros::given;

#[given("a poster with a profile photo")]
fn poster_with_photo(world: &mut HireFlowWorld) -> Result<(), eyre::Report> {
    let poster = run_async(world.member("poster@example.com"))?;
    world.poster = Some(poster);
    Ok(())
}

#[given("a helper who can receive payouts")]
fn payout_ready_helper(world: &mut HireFlowWorld) -> Result<(), eyre::Report> {
    let helper = run_async(world.member("helper@example.com"))?;
    run_async(world.make_payout_ready(helper))?;
    world.helper = Some(helper);
    Ok(())
}

#[given("the poster has posted a task priced at {dollars:i64} dollars")]
fn poster_posted_task(world: &mut HireFlowWorld, dollars: i64) -> Result<(), eyre::Report> {
    run_async(world.post_task(dollars))
}

#[given("the helper has offered on the task")]
fn helper_offered(world: &mut HireFlowWorld) -> Result<(), eyre::Report> {
    run_async(world.submit_offer())
}

#[given("the helper has been hired for a task priced at {dollars:i64} dollars")]
fn helper_hired(world: &mut HireFlowWorld, dollars: i64) -> Result<(), eyre::Report> {
    run_async(world.post_task(dollars))?;
    run_async(world.submit_offer())?;
    run_async(world.choose_helper())?;
    run_async(world.confirm_checkout())
}
