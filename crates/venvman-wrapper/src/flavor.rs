/// The shell-function family a [`crate::WrapperDriver`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapperFlavor {
    pub name: &'static str,
    pub list_command: &'static str,
    pub make_command: &'static str,
    pub remove_command: &'static str,
    /// `virtualenvwrapper` returns 1 from several commands that worked.
    pub success_statuses: &'static [i32],
}

pub const VIRTUALENVWRAPPER: WrapperFlavor = WrapperFlavor {
    name: "virtualenvwrapper",
    list_command: "lsvirtualenv",
    make_command: "mkvirtualenv",
    remove_command: "rmvirtualenv",
    success_statuses: &[0, 1],
};

pub const VIRTUALENV_SH: WrapperFlavor = WrapperFlavor {
    name: "virtualenv-sh",
    list_command: "lsvirtualenvs",
    make_command: "mkvirtualenv",
    remove_command: "rmvirtualenv",
    success_statuses: &[0],
};
