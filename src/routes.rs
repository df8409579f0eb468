use crate::{
    api::{attendance, employee, leave, performance, salary, task},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Auth routes. login/refresh/logout are public; user/validate/register
    // authenticate through the AuthUser extractor.
    cfg.service(
        web::scope(&format!("{}/auth", config.api_prefix))
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            )
            .service(web::resource("/user").route(web::get().to(handlers::current_user)))
            .service(web::resource("/validate").route(web::get().to(handlers::validate_token))),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    .service(
                        web::resource("/checkin")
                            .route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/checkout")
                            .route(web::put().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/absent")
                            .route(web::post().to(attendance::mark_absent)),
                    )
                    .service(
                        web::resource("/correct")
                            .route(web::put().to(attendance::correct_attendance)),
                    )
                    .service(
                        web::resource("/today/{employee_id}")
                            .route(web::get().to(attendance::today_status)),
                    )
                    .service(
                        web::resource("/employee/{employee_id}")
                            .route(web::get().to(attendance::employee_attendance)),
                    )
                    .service(
                        web::resource("/summary/{employee_id}")
                            .route(web::get().to(attendance::attendance_summary)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // literal segment before the dynamic one
                    .service(
                        web::resource("/current")
                            .route(web::get().to(employee::current_employee)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/leaves")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::leave_list))
                            .route(web::post().to(leave::create_leave)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    ),
            )
            .service(
                web::scope("/salaries")
                    .service(
                        web::resource("")
                            .route(web::post().to(salary::create_salary))
                            .route(web::get().to(salary::list_salaries)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(salary::get_salary))
                            .route(web::put().to(salary::update_salary))
                            .route(web::delete().to(salary::delete_salary)),
                    ),
            )
            .service(
                web::scope("/tasks")
                    .service(
                        web::resource("")
                            .route(web::post().to(task::create_task))
                            .route(web::get().to(task::list_tasks)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(task::delete_task)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(task::update_task_status)),
                    )
                    .service(
                        web::resource("/{id}/timer/start")
                            .route(web::post().to(task::start_timer)),
                    )
                    .service(
                        web::resource("/{id}/timer/stop")
                            .route(web::post().to(task::stop_timer)),
                    ),
            )
            .service(
                web::scope("/performance")
                    .service(
                        web::resource("")
                            .route(web::post().to(performance::create_review))
                            .route(web::get().to(performance::list_reviews)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(performance::get_review))
                            .route(web::put().to(performance::update_review))
                            .route(web::delete().to(performance::delete_review)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
