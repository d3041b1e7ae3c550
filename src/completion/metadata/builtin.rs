//! 内置命令规范
//!
//! 常见命令的规范，初始化时注册；同名的已注册规范优先。

use super::command_spec::{ArgSpec, OptionSpec, Spec, Template};
use crate::completion::generators::get_generator;
use crate::completion::types::Suggestion;

/// 加载所有内置规范
pub fn load_builtin_specs() -> Vec<Spec> {
    vec![
        git_spec(),
        cd_spec(),
        ls_spec(),
        cat_spec(),
        mkdir_spec(),
        npm_spec(),
        docker_spec(),
        kubectl_spec(),
    ]
}

/// 参数使用命名生成器
fn generated_arg(name: &str, generator: &str) -> ArgSpec {
    let arg = ArgSpec::named(name);
    match get_generator(generator) {
        Some(generator) => arg.with_generator(generator),
        None => arg,
    }
}

fn path_arg(name: &str, template: Template) -> ArgSpec {
    ArgSpec::named(name).with_template(template)
}

fn git_spec() -> Spec {
    Spec::new("git")
        .with_description("The stupid content tracker")
        .with_subcommand(
            Spec::new("checkout")
                .with_alias("co")
                .with_description("Switch branches or restore working tree files")
                .with_arg(generated_arg("branch", "git:branches"))
                .with_option(
                    OptionSpec::new("-b").with_description("Create and checkout a new branch"),
                )
                .with_option(OptionSpec::new("--force").with_description("Throw away local changes")),
        )
        .with_subcommand(
            Spec::new("branch")
                .with_description("List, create, or delete branches")
                .with_arg(generated_arg("branch", "git:branches").optional())
                .with_option(
                    OptionSpec::with_names(["-d", "--delete"]).with_description("Delete a branch"),
                )
                .with_option(
                    OptionSpec::with_names(["-a", "--all"])
                        .with_description("List both remote and local branches"),
                ),
        )
        .with_subcommand(
            Spec::new("commit")
                .with_description("Record changes to the repository")
                .with_option(
                    OptionSpec::with_names(["-m", "--message"])
                        .with_description("Use the given message as the commit message")
                        .with_arg(ArgSpec::named("message")),
                )
                .with_option(
                    OptionSpec::with_names(["-a", "--all"])
                        .with_description("Stage all modified and deleted files"),
                )
                .with_option(OptionSpec::new("--amend").with_description("Amend the previous commit")),
        )
        .with_subcommand(
            Spec::new("push")
                .with_description("Update remote refs along with associated objects")
                .with_arg(generated_arg("remote", "git:remotes").optional())
                .with_option(
                    OptionSpec::with_names(["-u", "--set-upstream"])
                        .with_description("Set upstream for the current branch"),
                )
                .with_option(
                    OptionSpec::with_names(["-f", "--force"]).with_description("Force update"),
                ),
        )
        .with_subcommand(
            Spec::new("pull")
                .with_description("Fetch from and integrate with another repository")
                .with_arg(generated_arg("remote", "git:remotes").optional()),
        )
        .with_subcommand(
            Spec::new("add")
                .with_description("Add file contents to the index")
                .with_arg(path_arg("pathspec", Template::Filepaths).variadic())
                .with_option(OptionSpec::with_names(["-A", "--all"]).with_description("Add all changes")),
        )
        .with_subcommand(
            Spec::new("status")
                .with_alias("st")
                .with_description("Show the working tree status")
                .with_option(
                    OptionSpec::with_names(["-s", "--short"]).with_description("Short format"),
                ),
        )
        .with_subcommand(
            Spec::new("stash")
                .with_description("Stash the changes in a dirty working directory")
                .with_subcommand(
                    Spec::new("pop").with_arg(generated_arg("stash", "git:stashes").optional()),
                )
                .with_subcommand(
                    Spec::new("apply").with_arg(generated_arg("stash", "git:stashes").optional()),
                )
                .with_subcommand(Spec::new("list")),
        )
        .with_subcommand(
            Spec::new("tag")
                .with_description("Create, list, delete or verify a tag object")
                .with_arg(generated_arg("tagname", "git:tags").optional()),
        )
        .with_option(OptionSpec::new("--version").with_description("Print the git version"))
        .with_option(OptionSpec::new("-C").with_arg(path_arg("path", Template::Folders)))
}

fn cd_spec() -> Spec {
    Spec::new("cd")
        .with_description("Change the working directory")
        .with_arg(path_arg("directory", Template::Folders))
}

fn ls_spec() -> Spec {
    Spec::new("ls")
        .with_description("List directory contents")
        .with_arg(path_arg("path", Template::Filepaths).variadic().optional())
        .with_option(OptionSpec::new("-a").with_description("Include entries starting with ."))
        .with_option(OptionSpec::new("-l").with_description("Use a long listing format"))
        .with_option(OptionSpec::new("-h").with_description("Human readable sizes"))
}

fn cat_spec() -> Spec {
    Spec::new("cat")
        .with_description("Concatenate and print files")
        .with_arg(path_arg("file", Template::Files).variadic())
        .with_option(OptionSpec::new("-n").with_description("Number all output lines"))
}

fn mkdir_spec() -> Spec {
    Spec::new("mkdir")
        .with_description("Make directories")
        .with_arg(path_arg("directory", Template::Folders).variadic())
        .with_option(
            OptionSpec::with_names(["-p", "--parents"])
                .with_description("Make parent directories as needed"),
        )
}

fn npm_spec() -> Spec {
    Spec::new("npm")
        .with_description("Node package manager")
        .with_subcommand(
            Spec::new("run")
                .with_alias("run-script")
                .with_description("Run arbitrary package scripts")
                .with_arg(generated_arg("script", "npm:scripts")),
        )
        .with_subcommand(
            Spec::new("install")
                .with_alias("i")
                .with_description("Install a package")
                .with_arg(ArgSpec::named("package").variadic().optional())
                .with_option(
                    OptionSpec::with_names(["-D", "--save-dev"])
                        .with_description("Save as a dev dependency"),
                ),
        )
        .with_subcommand(
            Spec::new("uninstall")
                .with_description("Remove a package")
                .with_arg(generated_arg("package", "npm:packages").variadic()),
        )
        .with_subcommand(Spec::new("test").with_alias("t").with_description("Test a package"))
}

fn docker_spec() -> Spec {
    Spec::new("docker")
        .with_description("Container runtime")
        .with_subcommand(
            Spec::new("ps")
                .with_description("List containers")
                .with_option(OptionSpec::with_names(["-a", "--all"]).with_description("Show all containers")),
        )
        .with_subcommand(
            Spec::new("exec")
                .with_description("Run a command in a running container")
                .with_arg(generated_arg("container", "docker:running-containers")),
        )
        .with_subcommand(
            Spec::new("logs")
                .with_description("Fetch the logs of a container")
                .with_arg(generated_arg("container", "docker:containers")),
        )
        .with_subcommand(
            Spec::new("run")
                .with_description("Create and run a new container from an image")
                .with_arg(generated_arg("image", "docker:images")),
        )
        .with_subcommand(
            Spec::new("rmi")
                .with_description("Remove one or more images")
                .with_arg(generated_arg("image", "docker:images").variadic()),
        )
}

fn kubectl_spec() -> Spec {
    let namespace = OptionSpec::with_names(["-n", "--namespace"])
        .with_description("Namespace scope for this request")
        .with_arg(generated_arg("namespace", "k8s:namespaces"));

    Spec::new("kubectl")
        .with_description("Kubernetes command-line tool")
        .with_subcommand(
            Spec::new("get")
                .with_description("Display one or many resources")
                .with_arg(
                    ArgSpec::named("resource")
                        .with_suggestion(resource("pods"))
                        .with_suggestion(resource("deployments"))
                        .with_suggestion(resource("services"))
                        .with_suggestion(resource("namespaces")),
                )
                .with_option(namespace.clone()),
        )
        .with_subcommand(
            Spec::new("logs")
                .with_description("Print the logs for a container in a pod")
                .with_arg(generated_arg("pod", "k8s:pods"))
                .with_option(namespace.clone()),
        )
        .with_subcommand(
            Spec::new("config")
                .with_description("Modify kubeconfig files")
                .with_subcommand(
                    Spec::new("use-context")
                        .with_arg(generated_arg("context", "k8s:contexts")),
                )
                .with_subcommand(Spec::new("get-contexts")),
        )
        .with_option(namespace)
}

fn resource(name: &str) -> Suggestion {
    Suggestion::new(name).with_description("Resource type")
}
