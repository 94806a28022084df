use rocket::http::Status;
use rocket::{Catcher, Request};

use crate::resp::problem::{problems, Problem};

fn with_instance(mut problem: Problem, req: &Request<'_>) -> Problem {
    problem.instance_uri(req.uri().path().to_string());
    problem
}

#[catch(401)]
fn unauthorized(req: &Request<'_>) -> Problem {
    let problem = req
        .local_cache(|| None::<Problem>)
        .clone()
        .unwrap_or_else(|| problems::unauthorized("No authorization token was found"));
    with_instance(problem, req)
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> Problem {
    with_instance(problems::not_found("Route"), req)
}

#[catch(400)]
fn bad_request(req: &Request<'_>) -> Problem {
    with_instance(problems::parse_problem(), req)
}

#[catch(422)]
fn unprocessable(req: &Request<'_>) -> Problem {
    let problem = Problem::new_untyped(
        Status::UnprocessableEntity,
        "The request body couldn't be processed.",
    );
    with_instance(problem, req)
}

#[catch(default)]
fn default_catcher(status: Status, req: &Request<'_>) -> Problem {
    let title = status.reason().unwrap_or("Unexpected error");
    with_instance(Problem::new_untyped(status, title), req)
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, not_found, bad_request, unprocessable, default_catcher]
}
