use crate::api::attendance::{
    AttendanceListItem, AttendanceListResponse, AttendanceQuery, AttendanceActionReq, CorrectAttendanceReq,
};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery, UpdateEmployee};
use crate::api::leave::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::performance::{CreateReview, ReviewListResponse, ReviewQuery, UpdateReview};
use crate::api::salary::{CreateSalary, SalaryListResponse, SalaryQuery, UpdateSalary};
use crate::api::task::{CreateTask, TaskListResponse, TaskQuery, UpdateTaskStatus};
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;
use crate::model::leave::{LeaveRequest, LeaveType};
use crate::model::performance::PerformanceReview;
use crate::model::salary::Salary;
use crate::model::task::Task;
use crate::models::{LoginReqDto, RegisterReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StaffHub API",
        version = "1.0.0",
        description = r#"
## Employee Management System

REST backend for a multi-role employee-management application.

### Key Features
- **Attendance**
  - Daily check-in/check-out, absence marking, manager corrections
- **Employee Management**
  - Create, update, list, and view employee profiles
- **Leave Management**
  - Apply for leave, approve/reject requests, and view leave history
- **Salaries**
  - Salary records with server-computed net pay
- **Tasks**
  - Assignment, status tracking and a server-driven work timer
- **Performance**
  - Periodic reviews with 1-5 ratings

### Security
Endpoints are protected with **JWT Bearer authentication**; access is
role-gated (admin / manager / employee).
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::register,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::current_user,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::mark_absent,
        crate::api::attendance::today_status,
        crate::api::attendance::list_attendance,
        crate::api::attendance::employee_attendance,
        crate::api::attendance::attendance_summary,
        crate::api::attendance::correct_attendance,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::current_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::create_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,

        crate::api::salary::create_salary,
        crate::api::salary::update_salary,
        crate::api::salary::get_salary,
        crate::api::salary::list_salaries,
        crate::api::salary::delete_salary,

        crate::api::task::create_task,
        crate::api::task::list_tasks,
        crate::api::task::update_task_status,
        crate::api::task::start_timer,
        crate::api::task::stop_timer,
        crate::api::task::delete_task,

        crate::api::performance::create_review,
        crate::api::performance::list_reviews,
        crate::api::performance::get_review,
        crate::api::performance::update_review,
        crate::api::performance::delete_review
    ),
    components(
        schemas(
            LoginReqDto,
            RegisterReq,
            AttendanceActionReq,
            CorrectAttendanceReq,
            AttendanceQuery,
            Attendance,
            AttendanceListItem,
            AttendanceListResponse,
            CreateEmployee,
            UpdateEmployee,
            EmployeeQuery,
            Employee,
            EmployeeListResponse,
            CreateLeave,
            LeaveFilter,
            LeaveType,
            LeaveRequest,
            LeaveListResponse,
            CreateSalary,
            UpdateSalary,
            SalaryQuery,
            Salary,
            SalaryListResponse,
            CreateTask,
            UpdateTaskStatus,
            TaskQuery,
            Task,
            TaskListResponse,
            CreateReview,
            UpdateReview,
            ReviewQuery,
            PerformanceReview,
            ReviewListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Authentication APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Salary", description = "Salary management APIs"),
        (name = "Task", description = "Task assignment and timer APIs"),
        (name = "Performance", description = "Performance review APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
