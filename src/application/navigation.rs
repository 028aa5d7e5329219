use chrono::{Days, NaiveDate};

use crate::domain::TaskId;

/// The screens of the client, mirroring the original app's page set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    TaskDetail(TaskId),
    DateTasks(NaiveDate),
    History,
}

/// Named navigation transitions. A calendar day click maps to `OpenDate`
/// whether or not the day has tasks; the date view renders its own empty
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    OpenTask(TaskId),
    OpenDate(NaiveDate),
    OpenHistory,
    /// Previous/next-day arrows on the date view.
    ShiftDate(i64),
    Back,
    Home,
}

/// Explicit navigation state machine with a back stack, replacing the ad hoc
/// callback threading of the original UI.
#[derive(Debug)]
pub struct Navigator {
    route: Route,
    stack: Vec<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            route: Route::Dashboard,
            stack: Vec::new(),
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// Applies a transition and returns the resulting route. Transitions
    /// that do not apply to the current route (e.g. `ShiftDate` outside the
    /// date view) leave the state unchanged.
    pub fn dispatch(&mut self, event: NavEvent) -> Route {
        match event {
            NavEvent::OpenTask(id) => self.push(Route::TaskDetail(id)),
            NavEvent::OpenDate(date) => self.push(Route::DateTasks(date)),
            NavEvent::OpenHistory => self.push(Route::History),
            NavEvent::ShiftDate(days) => {
                if let Route::DateTasks(date) = self.route {
                    // Shifting a day replaces the route instead of stacking,
                    // so Back returns to wherever the date view was opened
                    // from.
                    if let Some(shifted) = shift(date, days) {
                        self.route = Route::DateTasks(shifted);
                    }
                }
                self.route
            }
            NavEvent::Back => {
                self.route = self.stack.pop().unwrap_or(Route::Dashboard);
                self.route
            }
            NavEvent::Home => {
                self.stack.clear();
                self.route = Route::Dashboard;
                self.route
            }
        }
    }

    fn push(&mut self, route: Route) -> Route {
        if route != self.route {
            self.stack.push(self.route);
            self.route = route;
        }
        self.route
    }
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn open_and_back_walks_the_stack() {
        let mut nav = Navigator::new();
        assert_eq!(nav.route(), Route::Dashboard);

        nav.dispatch(NavEvent::OpenDate(date("2024-03-05")));
        nav.dispatch(NavEvent::OpenTask(TaskId(9)));
        assert_eq!(nav.route(), Route::TaskDetail(TaskId(9)));

        assert_eq!(
            nav.dispatch(NavEvent::Back),
            Route::DateTasks(date("2024-03-05"))
        );
        assert_eq!(nav.dispatch(NavEvent::Back), Route::Dashboard);
        // Back on an empty stack stays home.
        assert_eq!(nav.dispatch(NavEvent::Back), Route::Dashboard);
    }

    #[test]
    fn shift_date_replaces_instead_of_stacking() {
        let mut nav = Navigator::new();
        nav.dispatch(NavEvent::OpenDate(date("2024-03-31")));
        assert_eq!(
            nav.dispatch(NavEvent::ShiftDate(1)),
            Route::DateTasks(date("2024-04-01"))
        );
        assert_eq!(
            nav.dispatch(NavEvent::ShiftDate(-2)),
            Route::DateTasks(date("2024-03-30"))
        );
        // One Back skips the intermediate dates entirely.
        assert_eq!(nav.dispatch(NavEvent::Back), Route::Dashboard);
    }

    #[test]
    fn shift_date_outside_date_view_is_ignored() {
        let mut nav = Navigator::new();
        nav.dispatch(NavEvent::OpenHistory);
        assert_eq!(nav.dispatch(NavEvent::ShiftDate(1)), Route::History);
    }

    #[test]
    fn home_clears_the_stack() {
        let mut nav = Navigator::new();
        nav.dispatch(NavEvent::OpenHistory);
        nav.dispatch(NavEvent::OpenTask(TaskId(1)));
        assert_eq!(nav.dispatch(NavEvent::Home), Route::Dashboard);
        assert_eq!(nav.dispatch(NavEvent::Back), Route::Dashboard);
    }

    #[test]
    fn reopening_the_current_route_does_not_stack() {
        let mut nav = Navigator::new();
        nav.dispatch(NavEvent::OpenDate(date("2024-03-05")));
        nav.dispatch(NavEvent::OpenDate(date("2024-03-05")));
        assert_eq!(nav.dispatch(NavEvent::Back), Route::Dashboard);
    }
}
