//! Shell commands for generated tasks
//!
//! Every path and argument is shell-quoted; flag fragments coming from
//! architecture descriptors are inserted verbatim since they hold several
//! words.

use crate::arch::{self, Architecture, BuildOptions};
use crate::config::Config;
use crate::graph::naming::{add_prefix, object_name, source_object_name};
use crate::graph::{GraphError, GraphResult};
use crate::mode::{ModeSet, TranslationMode};

/// Quote one word for `sh`.
pub fn quote(word: &str) -> GraphResult<String> {
    shlex::try_quote(word)
        .map(|q| q.into_owned())
        .map_err(|_| GraphError::Quote(word.to_string()))
}

fn quote_all<'s>(words: impl IntoIterator<Item = &'s str>) -> GraphResult<Vec<String>> {
    words.into_iter().map(quote).collect()
}

/// Join non-empty fragments with single spaces.
fn line(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Locations of one benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Suite source root
    pub root: String,
    pub srcdir: String,
    pub dstdir: String,
}

/// Inputs of a run command, already rendered for one variant.
#[derive(Debug, Clone, Copy)]
pub struct RunSpec<'a> {
    pub binary: &'a str,
    pub args: &'a [String],
    pub stdin: Option<&'a str>,
    /// File receiving standard output
    pub stdout: &'a str,
    pub exp_rc: i32,
}

/// Inputs of a measure command.
#[derive(Debug, Clone, Copy)]
pub struct MeasureSpec<'a> {
    pub dstdir: &'a str,
    pub bench: &'a str,
    pub native_prefix: &'a str,
    pub foreign_prefix: &'a str,
    pub args: &'a [String],
    pub stdin: Option<&'a str>,
    pub exp_rc: i32,
}

/// Renders recipe lines from configuration and build options.
#[derive(Debug, Clone, Copy)]
pub struct Recipes<'a> {
    config: &'a Config,
    options: BuildOptions,
}

impl<'a> Recipes<'a> {
    pub fn new(config: &'a Config, options: BuildOptions) -> Self {
        Self { config, options }
    }

    pub fn modes(&self) -> &'a ModeSet {
        &self.config.modes
    }

    /// `objdump` to use, if one was found at configuration time.
    pub fn disassembler(&self) -> Option<&'a str> {
        self.config.tools.disassembler.as_deref()
    }

    /// Compile every source, combine the objects, link the binary.
    pub fn build_native(
        &self,
        arch: &Architecture,
        bench: &str,
        sources: &[String],
        cflags: &[String],
        libs: &[String],
        layout: &Layout,
    ) -> GraphResult<Vec<String>> {
        let cc = arch::cc(arch);
        let flags = line(&[&arch::cc_flags(arch, self.options), &cflags.join(" ")]);
        let objdir = format!("{}/obj/{}", layout.dstdir, bench);
        let out = format!("{}/{}", layout.dstdir, add_prefix(&arch.prefix, bench));
        let combined = format!("{}/{}", layout.dstdir, object_name(&arch.prefix, bench));

        let mut commands = vec![format!("mkdir -p {}", quote(&objdir)?)];
        let mut objects = Vec::with_capacity(sources.len());
        for source in sources {
            let obj = format!("{}/{}", objdir, source_object_name(&arch.prefix, source));
            let src = format!("{}/{}", layout.srcdir, source);
            commands.push(line(&[
                &cc,
                &flags,
                "-c -o",
                &quote(&obj)?,
                &quote(&src)?,
            ]));
            objects.push(obj);
        }

        commands.push(line(&[
            &arch::ld(arch),
            &arch.ld_flags,
            "-r -o",
            &quote(&combined)?,
            &quote_all(objects.iter().map(String::as_str))?.join(" "),
        ]));
        commands.push(line(&[
            &cc,
            &flags,
            "-o",
            &quote(&out)?,
            &quote(&combined)?,
            &libs.join(" "),
        ]));
        Ok(commands)
    }

    /// Translate the foreign object, lower it for `native`, link with the runtime.
    pub fn translate(
        &self,
        foreign: &Architecture,
        native: &Architecture,
        mode: TranslationMode,
        bench: &str,
        out: &str,
        libs: &[String],
        layout: &Layout,
    ) -> GraphResult<Vec<String>> {
        let foreign_obj = format!("{}/{}", layout.dstdir, object_name(&foreign.prefix, bench));
        let stem = format!("{}/{}", layout.dstdir, out);
        let bitcode = format!("{stem}.bc");
        let object = format!("{stem}.o");
        let runtime = self
            .config
            .dirs
            .sbt_share()
            .join(format!("{}-runtime.o", native.prefix))
            .display()
            .to_string();

        Ok(vec![
            line(&[
                &quote(&self.config.tools.translator)?,
                &self.config.sbt_flags.join(" "),
                &format!("-regs={mode}"),
                "-o",
                &quote(&bitcode)?,
                &quote(&foreign_obj)?,
            ]),
            line(&[
                &quote(&self.config.tools.llc)?,
                &arch::llc_flags(native, self.options),
                "-filetype=obj -o",
                &quote(&object)?,
                &quote(&bitcode)?,
            ]),
            line(&[
                &arch::cc(native),
                &arch::cc_flags(native, self.options),
                "-o",
                &quote(&stem)?,
                &quote(&object)?,
                &quote(&runtime)?,
                &libs.join(" "),
            ]),
        ])
    }

    /// Run a binary through the architecture's wrapper and check its exit code.
    pub fn run(&self, arch: &Architecture, req: RunSpec<'_>) -> GraphResult<String> {
        let args = quote_all(req.args.iter().map(String::as_str))?.join(" ");
        let stdin = match req.stdin {
            Some(path) => format!("< {}", quote(path)?),
            None => String::new(),
        };
        let redirect = format!("> {}", quote(req.stdout)?);
        let cmd = line(&[&arch.run, &quote(req.binary)?, &args, &stdin, &redirect]);

        if req.exp_rc == 0 {
            Ok(cmd)
        } else {
            Ok(format!("{cmd}; test $? -eq {}", req.exp_rc))
        }
    }

    /// Byte-for-byte comparison of a round trip's output with its input.
    pub fn compare(&self, output: &str, input: &str) -> GraphResult<String> {
        Ok(format!("cmp {} {}", quote(output)?, quote(input)?))
    }

    /// Disassemble `binary` into `listing`.
    pub fn disassemble(&self, objdump: &str, binary: &str, listing: &str) -> GraphResult<String> {
        Ok(format!(
            "{} -d {} > {}",
            quote(objdump)?,
            quote(binary)?,
            quote(listing)?
        ))
    }

    /// Invoke the measurement engine. `--args` goes last since it swallows the rest.
    pub fn measure(&self, req: MeasureSpec<'_>) -> GraphResult<String> {
        let mut parts = vec![
            quote(&self.config.tools.xbench)?,
            "measure".to_string(),
            quote(req.dstdir)?,
            quote(req.bench)?,
            "--native".to_string(),
            quote(req.native_prefix)?,
            "--foreign".to_string(),
            quote(req.foreign_prefix)?,
            "--modes".to_string(),
            self.config.modes.to_list(),
        ];
        if let Some(stdin) = req.stdin {
            parts.push("--stdin".to_string());
            parts.push(quote(stdin)?);
        }
        if req.exp_rc != 0 {
            parts.push("--exp-rc".to_string());
            parts.push(req.exp_rc.to_string());
        }
        if !req.args.is_empty() {
            parts.push("--args".to_string());
            parts.extend(quote_all(req.args.iter().map(String::as_str))?);
        }
        Ok(parts.join(" "))
    }

    pub fn clean(&self, dir: &str) -> GraphResult<String> {
        Ok(format!("rm -rf {}", quote(dir)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::{rv32_linux, x86};

    fn config() -> Config {
        Config::for_topdir("/top")
    }

    fn layout() -> Layout {
        Layout {
            root: "/top/mibench".into(),
            srcdir: "/top/mibench/security/sha".into(),
            dstdir: "/top/build/mibench/security/sha".into(),
        }
    }

    #[test]
    fn test_quote_plain_and_special_words() {
        assert_eq!(quote("/a/b.c").unwrap(), "/a/b.c");
        assert_eq!(quote("two words").unwrap(), "'two words'");
        assert!(quote("nul\0byte").is_err());
    }

    #[test]
    fn test_build_native_compiles_combines_and_links() {
        let config = config();
        let recipes = Recipes::new(&config, BuildOptions::default());
        let cmds = recipes
            .build_native(
                &x86(),
                "sha",
                &["sha_driver.c".into(), "sha.c".into()],
                &[],
                &["-lm".into()],
                &layout(),
            )
            .unwrap();

        let d = "/top/build/mibench/security/sha";
        assert_eq!(cmds.len(), 5);
        assert_eq!(cmds[0], format!("mkdir -p {d}/obj/sha"));
        assert_eq!(
            cmds[1],
            format!(
                "x86_64-linux-gnu-gcc -O3 -fno-exceptions -m32 -c -o {d}/obj/sha/x86-sha_driver.o /top/mibench/security/sha/sha_driver.c"
            )
        );
        assert_eq!(
            cmds[3],
            format!(
                "x86_64-linux-gnu-ld -m elf_i386 -r -o {d}/x86-sha.o {d}/obj/sha/x86-sha_driver.o {d}/obj/sha/x86-sha.o"
            )
        );
        assert_eq!(
            cmds[4],
            format!("x86_64-linux-gnu-gcc -O3 -fno-exceptions -m32 -o {d}/x86-sha {d}/x86-sha.o -lm")
        );
    }

    #[test]
    fn test_translate_uses_mode_and_runtime() {
        let config = config();
        let recipes = Recipes::new(&config, BuildOptions::default());
        let cmds = recipes
            .translate(
                &rv32_linux(&config.dirs),
                &x86(),
                TranslationMode::Locals,
                "sha",
                "rv32-x86-sha-locals",
                &[],
                &layout(),
            )
            .unwrap();

        let d = "/top/build/mibench/security/sha";
        assert_eq!(
            cmds[0],
            format!(
                "/top/toolchain/debug/bin/riscv-sbt -regs=locals -o {d}/rv32-x86-sha-locals.bc {d}/rv32-sha.o"
            )
        );
        assert!(cmds[1].starts_with("llc -relocation-model=static -O3 -march=x86 -mattr=avx -filetype=obj"));
        assert!(cmds[2].ends_with(&format!(
            "-o {d}/rv32-x86-sha-locals {d}/rv32-x86-sha-locals.o /top/toolchain/debug/share/riscv-sbt/x86-runtime.o"
        )));
    }

    #[test]
    fn test_run_with_wrapper_stdin_and_exit_code() {
        let config = config();
        let recipes = Recipes::new(&config, BuildOptions::default());
        let args = vec!["in put.dat".to_string()];
        let cmd = recipes
            .run(
                &rv32_linux(&config.dirs),
                RunSpec {
                    binary: "/b/rv32-x",
                    args: &args,
                    stdin: Some("/s/large.pcm"),
                    stdout: "/b/rv32-x.out",
                    exp_rc: 2,
                },
            )
            .unwrap();
        assert_eq!(
            cmd,
            "qemu-riscv32 -L /top/toolchain/release/opt/riscv/sysroot /b/rv32-x 'in put.dat' < /s/large.pcm > /b/rv32-x.out; test $? -eq 2"
        );
    }

    #[test]
    fn test_run_on_host_without_args() {
        let config = config();
        let recipes = Recipes::new(&config, BuildOptions::default());
        let cmd = recipes
            .run(
                &x86(),
                RunSpec {
                    binary: "/b/x86-x",
                    args: &[],
                    stdin: None,
                    stdout: "/b/x86-x.out",
                    exp_rc: 0,
                },
            )
            .unwrap();
        assert_eq!(cmd, "/b/x86-x > /b/x86-x.out");
    }

    #[test]
    fn test_measure_puts_args_last() {
        let config = config();
        let recipes = Recipes::new(&config, BuildOptions::default());
        let args = vec!["-v".to_string(), "/s/in.dat".to_string()];
        let cmd = recipes
            .measure(MeasureSpec {
                dstdir: "/b",
                bench: "crc32",
                native_prefix: "x86",
                foreign_prefix: "rv32",
                args: &args,
                stdin: Some("/s/in.pcm"),
                exp_rc: 1,
            })
            .unwrap();
        assert_eq!(
            cmd,
            "xbench measure /b crc32 --native x86 --foreign rv32 --modes globals,locals --stdin /s/in.pcm --exp-rc 1 --args -v /s/in.dat"
        );
    }

    #[test]
    fn test_compare_is_byte_exact_cmp() {
        let config = config();
        let recipes = Recipes::new(&config, BuildOptions::default());
        assert_eq!(recipes.compare("/b/out.dec", "/s/in.asc").unwrap(), "cmp /b/out.dec /s/in.asc");
    }
}
