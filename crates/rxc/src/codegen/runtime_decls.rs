//! Runtime function declarations and the builtin C stub.
//!
//! The generated module calls five external runtime functions; this module
//! declares them in the IR and carries the freestanding C source that
//! implements them. The driver streams the stub to stderr after the module
//! text; the test harness splits the combined output on the stub's first
//! line and compiles the two halves separately.

/// Default target triple; the external harness rewrites it for host runs.
pub const DEFAULT_TRIPLE: &str = "riscv64-unknown-elf";

/// Default datalayout matching the triple.
pub const DEFAULT_DATALAYOUT: &str = "e-m:e-p:64:64-i64:64-i128:128-n64-S128";

/// Names declared by `runtime_declarations`; arity prototypes must not
/// duplicate them.
pub fn is_runtime_fn(name: &str) -> bool {
    matches!(
        name,
        "printInt" | "printlnInt" | "printlnStr" | "getInt" | "exit_rt"
    )
}

/// External declarations of the runtime functions, emitted into every
/// module.
pub fn runtime_declarations() -> &'static str {
    "declare i64 @printInt(i64)\n\
     declare i64 @printlnInt(i64)\n\
     declare i64 @printlnStr(ptr)\n\
     declare i64 @getInt()\n\
     declare void @exit_rt(i64)\n"
}

/// The companion C stub linked against the assembled IR.
///
/// The stub is freestanding: no libc headers, raw `ecall` system calls
/// (RISC-V Linux ABI numbers), hand-rolled integer formatting and parsing.
/// The first line is the literal marker the harness splits on.
pub fn builtin_stub() -> &'static str {
    r#"typedef unsigned long size_t;

static long rx_ecall(long num, long a, long b, long c) {
    register long a0 __asm__("a0") = a;
    register long a1 __asm__("a1") = b;
    register long a2 __asm__("a2") = c;
    register long a7 __asm__("a7") = num;
    __asm__ volatile(".word 0x00000073"
                     : "+r"(a0)
                     : "r"(a1), "r"(a2), "r"(a7)
                     : "memory");
    return a0;
}

#define SYS_read 63
#define SYS_write 64
#define SYS_exit 93

static long rx_write(const char *buf, size_t len) {
    return rx_ecall(SYS_write, 1, (long)buf, (long)len);
}

static long rx_read_byte(char *c) {
    return rx_ecall(SYS_read, 0, (long)c, 1);
}

long printInt(long x) {
    char buf[21];
    int i = 21;
    unsigned long v = x < 0 ? -(unsigned long)x : (unsigned long)x;
    do {
        buf[--i] = '0' + (char)(v % 10);
        v /= 10;
    } while (v);
    if (x < 0) {
        buf[--i] = '-';
    }
    rx_write(buf + i, (size_t)(21 - i));
    return x;
}

long printlnInt(long x) {
    printInt(x);
    rx_write("\n", 1);
    return x;
}

long printlnStr(const char *s) {
    size_t n = 0;
    if (s) {
        while (s[n]) {
            n++;
        }
        rx_write(s, n);
    }
    rx_write("\n", 1);
    return 0;
}

long getInt(void) {
    char c;
    long v = 0;
    int neg = 0;
    long got = rx_read_byte(&c);
    while (got == 1 && (c == ' ' || c == '\n' || c == '\r' || c == '\t')) {
        got = rx_read_byte(&c);
    }
    if (got == 1 && c == '-') {
        neg = 1;
        got = rx_read_byte(&c);
    }
    while (got == 1 && c >= '0' && c <= '9') {
        v = v * 10 + (c - '0');
        got = rx_read_byte(&c);
    }
    return neg ? -v : v;
}

__attribute__((noreturn)) void exit_rt(long code) {
    rx_ecall(SYS_exit, code, 0, 0);
    for (;;) {
    }
}
"#
}
